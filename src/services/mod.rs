// Acme services
// Services provide supporting functionality: image caching, favicon fetching, settings, address resolution.

pub mod address_resolver;
pub mod favicon_service;
pub mod image_cache;
pub mod settings_engine;
