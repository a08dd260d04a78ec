//! Session registry and startup discovery

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::dio::DigitalPort;
use crate::error::{Result, ServerError};
use crate::hasher::IdentityHasher;
use crate::sdk::CameraSdk;
use crate::session::CameraSession;
use crate::types::{CameraIdentity, Fingerprint};

/// Number of substitution tables tried before a collision is fatal.
pub const MAX_TABLE_DRAWS: u64 = 8;

/// Inputs to [`SessionRegistry::bootstrap`].
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Hardware-interface search path handed to the SDK
    pub search_path: Option<PathBuf>,
    /// Register only the camera with this identity string
    pub camera_filter: Option<String>,
    /// Seed for reproducible fingerprints; random when `None`
    pub seed: Option<u64>,
}

/// Fingerprint-addressed sessions in discovery order.
pub struct SessionRegistry {
    sdk: Arc<dyn CameraSdk>,
    order: Vec<Fingerprint>,
    sessions: Vec<CameraSession>,
    index: HashMap<Fingerprint, usize>,
}

impl SessionRegistry {
    /// An empty registry over an already-started SDK.
    pub fn new(sdk: Arc<dyn CameraSdk>) -> Self {
        Self { sdk, order: Vec::new(), sessions: Vec::new(), index: HashMap::new() }
    }

    /// Start the SDK, enumerate cameras, fingerprint and open each one.
    ///
    /// Every failure here is fatal to the process. On error the SDK is shut
    /// down again and any camera opened so far is released.
    pub fn bootstrap(
        sdk: Arc<dyn CameraSdk>,
        options: &DiscoveryOptions,
        port: Option<DigitalPort>,
    ) -> Result<Self> {
        sdk.init(options.search_path.as_deref())
            .map_err(|code| ServerError::SdkInit { path: options.search_path.clone(), code })?;

        match Self::discover(sdk.clone(), options, port) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                sdk.shutdown();
                Err(e)
            }
        }
    }

    fn discover(
        sdk: Arc<dyn CameraSdk>,
        options: &DiscoveryOptions,
        port: Option<DigitalPort>,
    ) -> Result<Self> {
        let mut identities = sdk.list_cameras().map_err(|code| ServerError::Enumeration { code })?;
        if identities.is_empty() {
            return Err(ServerError::NoCameras);
        }
        info!("Found {} camera(s)", identities.len());

        if let Some(filter) = &options.camera_filter {
            let available = identities.len();
            identities.retain(|identity| &identity.id_string == filter);
            if identities.is_empty() {
                return Err(ServerError::FilterMismatch { id: filter.clone(), available });
            }
        }

        let fingerprints = assign_fingerprints(&identities, options.seed)?;
        let mut registry = Self::new(sdk.clone());
        for (identity, fingerprint) in identities.into_iter().zip(fingerprints) {
            let mut session = CameraSession::new(identity, sdk.clone(), port.clone());
            session.open().map_err(|code| ServerError::CameraOpen {
                id: session.identity().id_string.clone(),
                code,
            })?;
            info!(fingerprint = %fingerprint, "Registered camera {}", session.identity().id_string);
            registry.insert(fingerprint, session);
        }
        Ok(registry)
    }

    /// Add a session. A fingerprint that is already present is replaced in place.
    pub fn insert(&mut self, fingerprint: Fingerprint, session: CameraSession) {
        match self.index.get(&fingerprint) {
            Some(&i) => {
                warn!(fingerprint = %fingerprint, "Replacing registered session");
                self.sessions[i] = session;
            }
            None => {
                self.index.insert(fingerprint, self.sessions.len());
                self.order.push(fingerprint);
                self.sessions.push(session);
            }
        }
    }

    pub fn lookup(&self, fingerprint: Fingerprint) -> Option<&CameraSession> {
        self.index.get(&fingerprint).map(|&i| &self.sessions[i])
    }

    pub fn lookup_mut(&mut self, fingerprint: Fingerprint) -> Option<&mut CameraSession> {
        self.index.get(&fingerprint).map(|&i| &mut self.sessions[i])
    }

    /// Resolve a wire `cam_id`. Non-numeric ids resolve to nothing.
    pub fn resolve(&self, cam_id: &str) -> Option<Fingerprint> {
        cam_id.parse::<Fingerprint>().ok().filter(|fp| self.index.contains_key(fp))
    }

    /// Registered fingerprints in discovery order.
    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fingerprint, &CameraSession)> {
        self.order.iter().copied().zip(self.sessions.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Fingerprint, &mut CameraSession)> {
        self.order.iter().copied().zip(self.sessions.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn close_all(&mut self) {
        for session in &mut self.sessions {
            session.close();
        }
    }

    /// Close every session and release the SDK.
    pub fn shutdown(mut self) {
        self.close_all();
        self.sessions.clear();
        self.sdk.shutdown();
        info!("Camera API released");
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("order", &self.order)
            .field("sessions", &self.sessions)
            .finish()
    }
}

/// Fingerprint every identity, redrawing the substitution table on collision.
///
/// Draws are seeded from `seed + attempt` when a seed is given.
pub fn assign_fingerprints(
    identities: &[CameraIdentity],
    seed: Option<u64>,
) -> Result<Vec<Fingerprint>> {
    let mut collision = None;
    for attempt in 0..MAX_TABLE_DRAWS {
        let hasher = match seed {
            Some(seed) => IdentityHasher::with_seed(seed.wrapping_add(attempt)),
            None => IdentityHasher::new(),
        };
        match fingerprint_all(&hasher, identities) {
            Ok(fingerprints) => return Ok(fingerprints),
            Err(e) => {
                warn!("Fingerprint table draw {} rejected: {}", attempt + 1, e);
                collision = Some(e);
            }
        }
    }
    Err(collision.unwrap_or(ServerError::NoCameras))
}

fn fingerprint_all(
    hasher: &IdentityHasher,
    identities: &[CameraIdentity],
) -> Result<Vec<Fingerprint>> {
    let mut seen: HashMap<Fingerprint, &str> = HashMap::with_capacity(identities.len());
    let mut fingerprints = Vec::with_capacity(identities.len());
    for identity in identities {
        let fingerprint = hasher.fingerprint(&identity.id_string);
        if let Some(first) = seen.insert(fingerprint, &identity.id_string) {
            return Err(ServerError::FingerprintCollision {
                fingerprint,
                first: first.to_string(),
                second: identity.id_string.clone(),
            });
        }
        fingerprints.push(fingerprint);
    }
    Ok(fingerprints)
}
