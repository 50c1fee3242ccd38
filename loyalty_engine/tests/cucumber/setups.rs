use cucumber::given;
use loyalty_engine::db_types::OwnerId;

use crate::cucumber::{world::LoyaltySystem, LoyaltyWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LoyaltyWorld) {
    let system = LoyaltySystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the user '{word}' has signed up")]
async fn sign_up(world: &mut LoyaltyWorld, owner: String) {
    world.system().ledger.open_account(&OwnerId::from(owner)).await.expect("Error opening account");
}
