// File: herald-common/src/traits/mod.rs
pub mod platform;

pub use platform::{
    CacheView, EventDispatcher, EventListener, PlatformClient, RestClient, ShardInfo,
};
