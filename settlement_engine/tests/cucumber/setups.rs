use cucumber::given;

use crate::{cucumber::MarketWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketWorld) {
    let system = TestSystem::new().await;
    world.system = Some(system);
}
