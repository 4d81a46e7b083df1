use std::time::Duration;

use tokio_util::sync::CancellationToken;

use hosted_tests::{test_context, TestContextSetup};
use live_ticket_client::{FlowError, FlowState, Notice};
use live_ticket_ledger_client::TransactionError;

fn short_timeout() -> TestContextSetup {
    TestContextSetup {
        submit_timeout: Duration::from_secs(30),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn unsettled_init_times_out() -> anyhow::Result<()> {
    let ctx = test_context!(short_timeout());
    let flow = ctx.init_event();
    ctx.sim.pause_sends();

    let result = flow
        .submit(&flow.default_form(), &CancellationToken::new())
        .await;

    assert_eq!(
        Err(FlowError::Transaction(TransactionError::TimedOut(
            Duration::from_secs(30)
        ))),
        result
    );
    assert_eq!(FlowState::Failed(Notice::TimedOut), flow.state());
    assert!(flow.can_submit());
    assert!(flow.view().notice_is_error);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unsettled_purchase_times_out() -> anyhow::Result<()> {
    let ctx = test_context!(short_timeout());
    ctx.given_event(50)?;
    let flow = ctx.buy_ticket();
    ctx.sim.pause_sends();

    let result = flow.buy(&CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(FlowError::Transaction(TransactionError::TimedOut(_)))
    ));
    assert_eq!(Some(Notice::TimedOut), flow.notice());
    assert!(flow.can_buy());

    // nothing reaches the ledger while sends are held
    assert_eq!(50, ctx.sim.with_ledger(|ledger| ledger.ticket_left()));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelled_purchase_returns_to_idle() -> anyhow::Result<()> {
    let ctx = test_context!(short_timeout());
    ctx.given_event(50)?;
    let flow = ctx.buy_ticket();
    let cancel = CancellationToken::new();
    ctx.sim.pause_sends();

    let (result, ()) = tokio::join!(flow.buy(&cancel), async {
        assert!(flow.is_submitting());
        cancel.cancel();
    });

    assert_eq!(
        Err(FlowError::Transaction(TransactionError::Cancelled)),
        result
    );
    assert_eq!(FlowState::Idle, flow.state());
    assert_eq!(None, flow.notice());
    assert!(flow.can_buy());

    Ok(())
}

#[tokio::test]
async fn cancelled_token_sends_nothing() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = flow.submit(&flow.default_form(), &cancel).await;

    assert_eq!(
        Err(FlowError::Transaction(TransactionError::Cancelled)),
        result
    );
    assert_eq!(FlowState::Idle, flow.state());
    assert_eq!(0, ctx.sim.request_count());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn purchase_waits_for_the_full_default_timeout() -> anyhow::Result<()> {
    let ctx = test_context!(TestContextSetup {
        submit_timeout: live_ticket_client::config::LiveTicketAppConfig::DEFAULT_SUBMIT_TIMEOUT,
        ..Default::default()
    });
    ctx.given_event(50)?;
    let flow = ctx.buy_ticket();
    ctx.sim.pause_sends();

    let started = tokio::time::Instant::now();
    let result = flow.buy(&CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(FlowError::Transaction(TransactionError::TimedOut(_)))
    ));
    assert_eq!(Duration::from_secs(60), started.elapsed());

    Ok(())
}
