use serde_json::json;
use tokio_util::sync::CancellationToken;

use hosted_tests::{test_context, TestContextSetup, NOW};
use live_ticket_client::{
    init_event::InitEventForm, FixedOffset, FlowError, FlowState, Notice,
};
use live_ticket_ledger_client::WalletAdapter;
use live_ticket_simulation::RpcCall;

const ONE_DAY: i64 = 24 * 60 * 60;

#[tokio::test]
async fn init_without_wallet_sends_nothing() -> anyhow::Result<()> {
    let ctx = test_context!(TestContextSetup {
        connected: false,
        ..Default::default()
    });
    let flow = ctx.init_event();

    let result = flow
        .submit(&flow.default_form(), &CancellationToken::new())
        .await;

    assert_eq!(Err(FlowError::WalletRequired), result);
    assert_eq!(FlowState::Idle, flow.state());
    assert_eq!(Some(Notice::InitWalletRequired), flow.notice());
    assert_eq!(
        Some("Requires connected wallet".to_owned()),
        flow.view().notice
    );
    assert_eq!(0, ctx.sim.request_count());
    assert!(ctx.wallet.signed().is_empty());

    Ok(())
}

#[tokio::test]
async fn form_cannot_be_opened_without_wallet() -> anyhow::Result<()> {
    let ctx = test_context!(TestContextSetup {
        connected: false,
        ..Default::default()
    });
    let flow = ctx.init_event();

    assert!(!flow.open_form());
    assert!(!flow.view().open_enabled);

    ctx.wallet.connect("GLATECOMER");
    assert!(flow.open_form());
    assert!(flow.view().form_open);

    Ok(())
}

#[tokio::test]
async fn sale_end_must_be_strictly_in_the_future() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();

    // one day before `NOW`, the default form ends the sale exactly at `NOW`
    for form in [
        InitEventForm::with_defaults(NOW - ONE_DAY, ctx.local_offset),
        InitEventForm::with_defaults(NOW - 2 * ONE_DAY, ctx.local_offset),
    ] {
        let result = flow.submit(&form, &CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(FlowError::SaleEndNotInFuture { now: NOW, .. })
        ));
        assert_eq!(Some(Notice::SaleEndInPast), flow.notice());
        assert!(flow.view().notice_is_error);
    }

    assert_eq!(0, ctx.sim.request_count());

    Ok(())
}

#[tokio::test]
async fn invalid_numbers_are_reported_locally() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();
    let form = InitEventForm {
        ticket_count: "fifty".to_owned(),
        ..flow.default_form()
    };

    let result = flow.submit(&form, &CancellationToken::new()).await;

    assert!(result.unwrap_err().is_precondition());
    assert!(matches!(
        flow.notice(),
        Some(Notice::InvalidEventDetails(_))
    ));
    assert_eq!(FlowState::Idle, flow.state());
    assert_eq!(0, ctx.sim.request_count());

    Ok(())
}

#[tokio::test]
async fn init_sends_form_values_once() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();
    let organizer = ctx.wallet.account().unwrap();
    let form = InitEventForm {
        event_name: "Night Market".to_owned(),
        base_price: "2500".to_owned(),
        sale_end: "2027-01-15T20:30".to_owned(),
        ticket_count: "120".to_owned(),
    };

    assert!(flow.open_form());
    flow.submit(&form, &CancellationToken::new()).await?;

    assert_eq!(FlowState::Settled(()), flow.state());
    assert_eq!(Some(Notice::EventInitialized), flow.notice());
    assert_eq!(1, ctx.sim.sends_of("init"));

    let view = flow.view();
    assert_eq!(Some("Event initialized!".to_owned()), view.notice);
    assert!(!view.notice_is_error);
    assert!(!view.form_open);
    assert!(view.open_enabled);

    let sent = ctx
        .sim
        .journal()
        .into_iter()
        .find_map(|call| match call {
            RpcCall::Send(invocation) => Some(invocation),
            _ => None,
        })
        .unwrap();
    assert_eq!(ctx.sim.contract_id(), sent.contract_id);
    assert_eq!(
        json!({
            "organizer": organizer,
            "base_price": 2500,
            "sale_end": 1_800_045_000u64,
            "ticket_count": 120,
            "event_name": "Night Market",
        }),
        serde_json::Value::Object(sent.args)
    );

    let event = ctx.sim.with_ledger(|ledger| ledger.config().cloned()).unwrap();
    assert_eq!(organizer, event.organizer);
    assert_eq!(120, ctx.sim.with_ledger(|ledger| ledger.ticket_left()));

    Ok(())
}

#[tokio::test]
async fn rejected_init_can_be_retried() -> anyhow::Result<()> {
    let ctx = test_context!();
    ctx.given_event(50)?;
    let flow = ctx.init_event();

    let result = flow
        .submit(&flow.default_form(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(FlowError::Transaction(_))));
    assert_eq!(FlowState::Failed(Notice::InitFailed), flow.state());
    assert_eq!(Some("Init failed".to_owned()), flow.view().notice);
    assert!(flow.can_submit());
    assert!(flow.view().confirm_enabled);

    Ok(())
}

#[tokio::test]
async fn wallet_refusal_fails_without_sending() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();
    ctx.wallet.reject_signing("declined in extension");

    let result = flow
        .submit(&flow.default_form(), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(FlowError::Transaction(
            live_ticket_ledger_client::TransactionError::Signing(_)
        ))
    ));
    assert_eq!(Some(Notice::InitFailed), flow.notice());
    assert_eq!(0, ctx.sim.sends_of("init"));

    // the user changes their mind
    ctx.wallet.allow_signing();
    flow.submit(&flow.default_form(), &CancellationToken::new())
        .await?;
    assert_eq!(FlowState::Settled(()), flow.state());

    Ok(())
}

#[tokio::test]
async fn second_trigger_while_submitting_is_refused() -> anyhow::Result<()> {
    let ctx = test_context!();
    let flow = ctx.init_event();
    let form = flow.default_form();
    let cancel = CancellationToken::new();
    assert!(flow.open_form());

    ctx.sim.pause_sends();
    let (first, second) = tokio::join!(flow.submit(&form, &cancel), async {
        assert!(flow.is_submitting());

        let view = flow.view();
        assert_eq!("Initializing...", view.open_label);
        assert_eq!("Creating...", view.confirm_label);
        assert!(!view.confirm_enabled);
        assert!(!view.cancel_enabled);
        assert!(!flow.close_form());

        let second = flow.submit(&form, &cancel).await;
        ctx.sim.resume_sends();
        second
    });

    first?;
    assert_eq!(Err(FlowError::Busy), second);
    assert_eq!(1, ctx.sim.sends_of("init"));
    assert_eq!(Some(Notice::EventInitialized), flow.notice());

    Ok(())
}

#[tokio::test]
async fn sale_end_is_entered_in_local_time() -> anyhow::Result<()> {
    // `NOW` is 08:00 UTC, which is 03:00 at UTC-5
    let ctx = test_context!(TestContextSetup {
        local_offset: FixedOffset::west_opt(5 * 3600).unwrap(),
        ..Default::default()
    });
    let flow = ctx.init_event();
    let cancel = CancellationToken::new();

    let past = InitEventForm {
        sale_end: "2027-01-15T02:59".to_owned(),
        ..flow.default_form()
    };
    flow.submit(&past, &cancel).await.unwrap_err();
    assert_eq!(Some(Notice::SaleEndInPast), flow.notice());
    assert_eq!(0, ctx.sim.request_count());

    let soon = InitEventForm {
        sale_end: "2027-01-15T04:00".to_owned(),
        ..flow.default_form()
    };
    flow.submit(&soon, &cancel).await?;

    let event = ctx.sim.with_ledger(|ledger| ledger.config().cloned()).unwrap();
    assert_eq!(NOW as u64 + 3600, event.sale_end);

    Ok(())
}
