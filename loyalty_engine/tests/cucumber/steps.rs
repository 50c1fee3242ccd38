use cucumber::{then, when};
use loyalty_common::Points;
use loyalty_engine::{
    db_types::{OrderNumber, OrderStatusType, OwnerId},
    traits::{AccrualStatus, OracleResponse},
    LedgerApiError,
    OrderIntakeError,
    OrderManagement,
    SubmitOrderResult,
};

use crate::cucumber::LoyaltyWorld;

#[when(expr = "'{word}' submits order {word}")]
async fn submit_order(world: &mut LoyaltyWorld, owner: String, number: String) {
    let result = world.system().intake.submit_order(&OwnerId::from(owner), &number).await;
    world.last_submission = Some(result);
}

#[then("the submission is accepted")]
async fn submission_accepted(world: &mut LoyaltyWorld) {
    assert!(matches!(world.last_submission, Some(Ok(SubmitOrderResult::Accepted(_)))), "{:?}", world.last_submission);
}

#[then("the submission is already owned")]
async fn submission_already_owned(world: &mut LoyaltyWorld) {
    assert!(
        matches!(world.last_submission, Some(Ok(SubmitOrderResult::AlreadyOwned(_)))),
        "{:?}",
        world.last_submission
    );
}

#[then("the submission conflicts with another user")]
async fn submission_conflicts(world: &mut LoyaltyWorld) {
    assert!(
        matches!(world.last_submission, Some(Err(OrderIntakeError::OrderBelongsToAnotherUser(_)))),
        "{:?}",
        world.last_submission
    );
}

#[then("the submission is rejected as invalid")]
async fn submission_invalid(world: &mut LoyaltyWorld) {
    assert!(
        matches!(world.last_submission, Some(Err(OrderIntakeError::InvalidOrderNumber(_)))),
        "{:?}",
        world.last_submission
    );
}

#[when(expr = "the accrual system reports order {word} as PROCESSED with {float} points")]
async fn oracle_processed(world: &mut LoyaltyWorld, number: String, points: f64) {
    let accrual = Points::try_from(points).expect("Invalid points");
    world.system().oracle.reply_processed(&number, accrual);
}

#[when(expr = "the accrual system reports order {word} as {word}")]
async fn oracle_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let status = match status.as_str() {
        "REGISTERED" => AccrualStatus::Registered,
        "PROCESSING" => AccrualStatus::Processing,
        "INVALID" => AccrualStatus::Invalid,
        s => panic!("Unsupported accrual status {s}"),
    };
    world.system().oracle.reply_status(&number, status, None);
}

#[when(expr = "the accrual system does not know order {word}")]
async fn oracle_unknown(world: &mut LoyaltyWorld, number: String) {
    world.system().oracle.reply(&number, Ok(OracleResponse::NotRegistered));
}

#[when("the accrual poller runs")]
async fn run_poller(world: &mut LoyaltyWorld) {
    world.system().poller.run_cycle().await.expect("Error running poll cycle");
}

#[when("the ledger is reconciled")]
async fn reconcile(world: &mut LoyaltyWorld) {
    world.system().ledger.reconcile().await.expect("Error reconciling ledger");
}

#[when(expr = "'{word}' withdraws {float} points against order {word}")]
async fn withdraw(world: &mut LoyaltyWorld, owner: String, points: f64, number: String) {
    let sum = Points::try_from(points).expect("Invalid points");
    let result = world.system().ledger.withdraw(&OwnerId::from(owner), &number, sum).await;
    world.last_withdrawal = Some(result);
}

#[then("the withdrawal succeeds")]
async fn withdrawal_succeeds(world: &mut LoyaltyWorld) {
    assert!(matches!(world.last_withdrawal, Some(Ok(_))), "{:?}", world.last_withdrawal);
}

#[then("the withdrawal is refused for insufficient funds")]
async fn withdrawal_refused(world: &mut LoyaltyWorld) {
    assert!(
        matches!(world.last_withdrawal, Some(Err(LedgerApiError::InsufficientFunds { .. }))),
        "{:?}",
        world.last_withdrawal
    );
}

#[then(expr = "the order {word} has status {word}")]
async fn check_order_status(world: &mut LoyaltyWorld, number: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order = world
        .system()
        .db
        .fetch_order_by_number(&OrderNumber::from(number.as_str()))
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.status, expected, "Order {number} has the wrong status");
}

#[then(expr = "the balance for '{word}' is {float} points with {float} withdrawn")]
async fn check_balance(world: &mut LoyaltyWorld, owner: String, current: f64, withdrawn: f64) {
    let balance = world.system().ledger.balance(&OwnerId::from(owner)).await.expect("Error fetching balance");
    assert_eq!(balance.current, Points::try_from(current).unwrap(), "Current balance is incorrect");
    assert_eq!(balance.withdrawn, Points::try_from(withdrawn).unwrap(), "Withdrawn total is incorrect");
}

#[then(expr = "'{word}' has {int} withdrawals")]
async fn check_withdrawal_count(world: &mut LoyaltyWorld, owner: String, count: usize) {
    let withdrawals = world.system().ledger.withdrawals(&OwnerId::from(owner)).await.expect("Error fetching withdrawals");
    assert_eq!(withdrawals.len(), count);
}
