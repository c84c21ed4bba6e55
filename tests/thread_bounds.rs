//! Compile-time guards on which types may cross threads.
use brawl::character::Character;
use brawl::input::VirtualInput;
use brawl::navigation::NavGraph;
use brawl::plugin::ArenaState;
use brawl::{Arena, SimConfig, TileMap};
use static_assertions::{assert_impl_all, assert_not_impl_any};

// Plain data is freely shareable.
assert_impl_all!(Character: Clone, Send, Sync);
assert_impl_all!(VirtualInput: Copy, Send, Sync);
assert_impl_all!(NavGraph: Clone, Send, Sync);
assert_impl_all!(SimConfig: Clone, Send, Sync);
assert_impl_all!(TileMap: Clone, Send, Sync);

// Injected providers and sinks are not required to be `Send`, so the arena
// lives in a non-send Bevy resource.
assert_not_impl_any!(Arena: Send);
assert_not_impl_any!(ArenaState: Send);
