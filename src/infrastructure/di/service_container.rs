//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::OutlineService;
use crate::config::Settings;
use crate::infrastructure::pdf::LopdfLoader;
use crate::infrastructure::traits::{DocumentLoader, FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Document backend
    pub loader: Arc<dyn DocumentLoader>,

    pub outline: OutlineService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), Arc::new(LopdfLoader))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        let settings = Arc::new(settings);
        let outline = OutlineService::new(Arc::clone(&fs), Arc::clone(&loader));

        Self {
            settings,
            fs,
            loader,
            outline,
        }
    }
}
