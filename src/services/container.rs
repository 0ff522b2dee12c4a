use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Role a service is registered under. A closed set: adding a service means
/// adding a variant, and a missing binding is caught at resolution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceToken {
    EventBus,
    ErrorHandler,
    MicrophoneSensor,
    TextInputSensor,
    FileUploadSensor,
    OpenAiService,
    EmotionProcessor,
    IntentProcessor,
    FileValidator,
    FileStorageService,
    CharacterGenerationService,
    CharacterService,
    ConversationService,
    CharacterRepository,
}

impl ServiceToken {
    pub const ALL: [ServiceToken; 14] = [
        ServiceToken::EventBus,
        ServiceToken::ErrorHandler,
        ServiceToken::MicrophoneSensor,
        ServiceToken::TextInputSensor,
        ServiceToken::FileUploadSensor,
        ServiceToken::OpenAiService,
        ServiceToken::EmotionProcessor,
        ServiceToken::IntentProcessor,
        ServiceToken::FileValidator,
        ServiceToken::FileStorageService,
        ServiceToken::CharacterGenerationService,
        ServiceToken::CharacterService,
        ServiceToken::ConversationService,
        ServiceToken::CharacterRepository,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ServiceToken::EventBus => "EventBus",
            ServiceToken::ErrorHandler => "ErrorHandler",
            ServiceToken::MicrophoneSensor => "MicrophoneSensor",
            ServiceToken::TextInputSensor => "TextInputSensor",
            ServiceToken::FileUploadSensor => "FileUploadSensor",
            ServiceToken::OpenAiService => "OpenAIService",
            ServiceToken::EmotionProcessor => "EmotionProcessor",
            ServiceToken::IntentProcessor => "IntentProcessor",
            ServiceToken::FileValidator => "FileValidator",
            ServiceToken::FileStorageService => "FileStorageService",
            ServiceToken::CharacterGenerationService => "CharacterGenerationService",
            ServiceToken::CharacterService => "CharacterService",
            ServiceToken::ConversationService => "ConversationService",
            ServiceToken::CharacterRepository => "CharacterRepository",
        }
    }
}

impl fmt::Display for ServiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("service '{0}' is not registered")]
    NotRegistered(ServiceToken),
    #[error("service '{0}' is registered with a different type")]
    TypeMismatch(ServiceToken),
}

/// Type-erased service value.
pub type Service = Arc<dyn Any + Send + Sync>;

type Factory = Box<dyn Fn() -> Service + Send + Sync>;

enum Registration {
    Instance(Service),
    Singleton(Factory),
    Transient(Factory),
}

/// Dependency injection container. A token holds exactly one registration
/// kind at a time; re-registration overwrites (and drops any stale cached
/// singleton for that token).
#[derive(Default)]
pub struct ServiceContainer {
    registrations: HashMap<ServiceToken, Registration>,
    singletons: HashMap<ServiceToken, Service>,
}

impl ServiceContainer {
    pub fn new() -> ServiceContainer {
        ServiceContainer::default()
    }

    /// Store a fixed value under the token.
    pub fn register<T>(&mut self, token: ServiceToken, instance: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let service: Service = instance;
        self.singletons.remove(&token);
        self.registrations
            .insert(token, Registration::Instance(service));
    }

    /// Store a constructor invoked lazily on first resolve, then cached.
    pub fn register_singleton<T, F>(&mut self, token: ServiceToken, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.singletons.remove(&token);
        self.registrations.insert(
            token,
            Registration::Singleton(Box::new(move || {
                let service: Service = factory();
                service
            })),
        );
    }

    /// Store a constructor invoked fresh on every resolve.
    pub fn register_transient<T, F>(&mut self, token: ServiceToken, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.singletons.remove(&token);
        self.registrations.insert(
            token,
            Registration::Transient(Box::new(move || {
                let service: Service = factory();
                service
            })),
        );
    }

    /// Resolve a token. Direct instances win, then singletons (constructed
    /// and cached on first call), then transients.
    pub fn resolve<T>(&mut self, token: ServiceToken) -> Result<Arc<T>, ContainerError>
    where
        T: Any + Send + Sync,
    {
        let service = match self.registrations.get(&token) {
            Some(Registration::Instance(instance)) => instance.clone(),
            Some(Registration::Singleton(factory)) => match self.singletons.get(&token) {
                Some(cached) => cached.clone(),
                None => {
                    let created = factory();
                    self.singletons.insert(token, created.clone());
                    created
                }
            },
            Some(Registration::Transient(factory)) => factory(),
            None => return Err(ContainerError::NotRegistered(token)),
        };

        service
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch(token))
    }

    /// Whether the token has any registration. Never constructs.
    pub fn is_registered(&self, token: ServiceToken) -> bool {
        self.registrations.contains_key(&token)
    }

    /// Drop all registrations and cached singleton instances.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.singletons.clear();
    }
}
