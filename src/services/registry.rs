use std::any::Any;
use std::sync::Arc;

use super::character::{VideoCatalog, default_clips_dir};
use super::container::{ContainerError, ServiceContainer, ServiceToken};

/// Inert stand-in registered for service roles that have no implementation
/// yet. Resolving one succeeds; it just does nothing.
#[derive(Debug)]
pub struct Placeholder;

/// Configures and owns the service container. Constructed by the composition
/// root and passed where needed; there is no process-global instance.
pub struct ServiceRegistry {
    container: ServiceContainer,
    initialized: bool,
}

impl ServiceRegistry {
    pub fn new() -> ServiceRegistry {
        ServiceRegistry {
            container: ServiceContainer::new(),
            initialized: false,
        }
    }

    /// Register every known service token, once. Subsequent calls are no-ops
    /// until `reset`.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        self.register_core_services();
        self.register_sensor_services();
        self.register_ai_services();
        self.register_business_services();
        self.register_storage_services();

        self.initialized = true;
        log::info!("service registry initialized");
    }

    /// Restore a clean state: all registrations and cached instances dropped.
    pub fn reset(&mut self) {
        self.container.clear();
        self.initialized = false;
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Resolve a service, initializing the registry first if needed.
    /// Container failures surface unchanged.
    pub fn get<T>(&mut self, token: ServiceToken) -> Result<Arc<T>, ContainerError>
    where
        T: Any + Send + Sync,
    {
        if !self.initialized {
            self.initialize();
        }
        self.container.resolve(token)
    }

    pub fn container_mut(&mut self) -> &mut ServiceContainer {
        &mut self.container
    }

    fn register_core_services(&mut self) {
        // Event bus and error handler arrive with the conversation features.
        self.container
            .register_singleton(ServiceToken::EventBus, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::ErrorHandler, || Arc::new(Placeholder));
    }

    fn register_sensor_services(&mut self) {
        self.container
            .register_singleton(ServiceToken::MicrophoneSensor, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::TextInputSensor, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::FileUploadSensor, || Arc::new(Placeholder));
    }

    fn register_ai_services(&mut self) {
        self.container
            .register_singleton(ServiceToken::OpenAiService, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::EmotionProcessor, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::IntentProcessor, || Arc::new(Placeholder));
    }

    fn register_business_services(&mut self) {
        self.container
            .register_singleton(ServiceToken::FileValidator, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::FileStorageService, || Arc::new(Placeholder));
        self.container
            .register_singleton(ServiceToken::CharacterGenerationService, || {
                Arc::new(Placeholder)
            });
        self.container
            .register_singleton(ServiceToken::CharacterService, || {
                Arc::new(VideoCatalog::with_builtin_characters(&default_clips_dir()))
            });
        self.container
            .register_singleton(ServiceToken::ConversationService, || Arc::new(Placeholder));
    }

    fn register_storage_services(&mut self) {
        self.container
            .register_singleton(ServiceToken::CharacterRepository, || Arc::new(Placeholder));
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        ServiceRegistry::new()
    }
}
