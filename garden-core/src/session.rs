//! GardenSession - one open garden.
//!
//! The session owns everything a viewport needs: the static scene, the
//! memory store and its connections, the interaction state, the ambient
//! mixer, the AI gateway and any requests still in flight. Create it when
//! the garden opens and [`dispose`](GardenSession::dispose) it when it
//! closes; disposal cancels outstanding requests so their results are
//! never applied.

use crate::audio::AmbientMixer;
use crate::config::GardenConfig;
use crate::gateway::{AiGateway, PendingRequest};
use crate::interaction::{GardenEvent, InteractionState};
use crate::memory::{Memory, MemoryDraft, MemoryError, MemoryId};
use crate::scene::{build_scene, create_tree, MeshGroup, ObjectFactory, Scene};
use crate::store::{ConnectionSegment, Connections, MemoryStore};
use crate::zone::Emotion;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// A relatedness lookup started for a freshly planted memory.
#[derive(Debug)]
struct RelatedLookup {
    subject: MemoryId,
    request: PendingRequest<Vec<MemoryId>>,
}

/// An open memory garden.
#[derive(Debug)]
pub struct GardenSession {
    config: GardenConfig,
    factory: ObjectFactory,
    scene: Scene,
    store: MemoryStore,
    connections: Connections,
    interaction: InteractionState,
    mixer: AmbientMixer,
    gateway: Option<AiGateway>,
    lookups: Vec<RelatedLookup>,
    rng: StdRng,
    disposed: bool,
}

impl GardenSession {
    /// Open a garden with the standard object factory.
    ///
    /// `seed` drives decoration placement and memory scattering. Without an
    /// API key the session runs with AI features off.
    pub fn create(config: GardenConfig, seed: u64) -> Self {
        Self::with_factory(config, seed, ObjectFactory::standard())
    }

    pub fn with_factory(config: GardenConfig, seed: u64, factory: ObjectFactory) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let scene = build_scene(&factory, &mut rng);
        let interaction = InteractionState::new(Default::default(), scene.ground_plane);
        let mut mixer = AmbientMixer::new();
        mixer.set_zone(interaction.current_zone(), 0.0);

        let gateway = gateway_for(&config);
        info!(
            objects = scene.len(),
            ai = gateway.is_some(),
            "garden session created"
        );

        Self {
            config,
            factory,
            scene,
            store: MemoryStore::new(),
            connections: Connections::new(),
            interaction,
            mixer,
            gateway,
            lookups: Vec::new(),
            rng,
            disposed: false,
        }
    }

    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    /// Replace the configuration and rebuild the gateway from it.
    pub fn reconfigure(&mut self, config: GardenConfig) {
        self.gateway = gateway_for(&config);
        self.config = config;
    }

    pub fn set_gateway(&mut self, gateway: Option<AiGateway>) {
        self.gateway = gateway;
    }

    pub fn gateway(&self) -> Option<&AiGateway> {
        self.gateway.as_ref()
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.factory
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn memory(&self, id: MemoryId) -> Option<&Memory> {
        self.store.get(id)
    }

    /// The memory whose tree is under the pointer, if any.
    pub fn hovered_memory(&self) -> Option<&Memory> {
        self.interaction.hovered().and_then(|id| self.store.get(id))
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionState {
        &mut self.interaction
    }

    pub fn mixer(&self) -> &AmbientMixer {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut AmbientMixer {
        &mut self.mixer
    }

    pub fn current_zone(&self) -> Emotion {
        self.interaction.current_zone()
    }

    /// Number of relatedness lookups still in flight.
    pub fn pending_lookups(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Plant a memory.
    ///
    /// When a gateway is configured and other memories exist, a relatedness
    /// lookup is started on `runtime`; its result is applied by
    /// [`poll_pending`](Self::poll_pending).
    pub fn plant(&mut self, draft: MemoryDraft, runtime: &Handle) -> Result<MemoryId, MemoryError> {
        if self.disposed {
            warn!("Planting into a disposed garden");
            return Err(MemoryError::GardenClosed);
        }
        let id = self.store.add(draft, &mut self.rng)?;

        if let Some(gateway) = self.gateway.clone() {
            if self.store.len() > 1 {
                let memories: Vec<Memory> = self.store.iter().cloned().collect();
                let subject = self.store.get(id).cloned().ok_or(MemoryError::UnknownMemory(id))?;
                let request = PendingRequest::spawn(runtime, "find_related", async move {
                    gateway.find_related(&memories, &subject).await
                });
                self.lookups.push(RelatedLookup {
                    subject: id,
                    request,
                });
            }
        }

        Ok(id)
    }

    /// Apply every finished lookup. Returns how many links were added.
    pub fn poll_pending(&mut self) -> usize {
        let mut added = 0;
        let mut finished = Vec::new();

        self.lookups.retain_mut(|lookup| match lookup.request.try_take() {
            None => true,
            Some(Ok(ids)) => {
                finished.push((lookup.subject, ids));
                false
            }
            Some(Err(e)) => {
                warn!(
                    label = lookup.request.label(),
                    "Related lookup for {} ended without a result: {}", lookup.subject, e
                );
                false
            }
        });

        for (subject, ids) in finished {
            added += self.apply_related(subject, ids);
        }
        added
    }

    /// Merge relatedness results into the connections.
    pub fn apply_related(&mut self, subject: MemoryId, related: Vec<MemoryId>) -> usize {
        let added = self.connections.link(subject, related, &self.store);
        if added > 0 {
            info!(subject = %subject, added, "memories connected");
        }
        added
    }

    /// One tree per memory, following a drag in progress.
    pub fn tree_groups(&self) -> Vec<MeshGroup> {
        let preview = self.interaction.drag_preview();
        self.store
            .iter()
            .map(|memory| {
                let tree = create_tree(memory);
                match preview {
                    Some((id, position)) if id == memory.id => tree.at(position.to_vec3(0.0)),
                    _ => tree,
                }
            })
            .collect()
    }

    pub fn connection_segments(&self) -> Vec<ConnectionSegment> {
        self.connections.segments(&self.store)
    }

    /// Advance the interaction loop by `dt` seconds; `now` is the audio clock.
    pub fn tick(&mut self, dt: f32, now: f64) -> Vec<GardenEvent> {
        if self.disposed {
            return Vec::new();
        }
        let events = self.interaction.tick(dt, &self.store);
        for event in &events {
            if let GardenEvent::ZoneChanged { to, .. } = event {
                self.mixer.set_zone(*to, now);
            }
        }
        self.mixer.prune(now);
        events
    }

    pub fn pointer_down(&mut self, modifier: bool) -> Option<GardenEvent> {
        if self.disposed {
            return None;
        }
        self.interaction.pointer_down(modifier, &self.store)
    }

    pub fn pointer_up(&mut self) -> Option<GardenEvent> {
        if self.disposed {
            return None;
        }
        self.interaction.pointer_up(&mut self.store)
    }

    /// Close the garden: cancel in-flight lookups, drop any drag, silence
    /// the ambience and detach the gateway.
    pub fn dispose(&mut self, now: f64) {
        if self.disposed {
            return;
        }
        let cancelled = self.lookups.len();
        for lookup in self.lookups.drain(..) {
            lookup.request.cancel();
        }
        self.interaction.cancel_drag();
        self.mixer.stop(now);
        self.gateway = None;
        self.disposed = true;
        info!(cancelled, memories = self.store.len(), "garden session disposed");
    }
}

fn gateway_for(config: &GardenConfig) -> Option<AiGateway> {
    if !config.has_api_key() {
        return None;
    }
    match AiGateway::from_config(config) {
        Ok(gateway) => Some(gateway),
        Err(e) => {
            warn!("AI features disabled: {}", e);
            None
        }
    }
}
