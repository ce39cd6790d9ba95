mod common;

use common::{attach_machine, default_account, receiver_address, TestStack};

use wallet_session_core::{
    DraftField, ProviderError, TransferFailure, TransferStatus, WalletError,
};

async fn connected_stack_with_draft(amount: &str) -> TestStack {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");
    stack
        .machine
        .edit_draft(
            default_account(),
            DraftField::Receiver,
            receiver_address().to_string(),
        )
        .expect("edit receiver");
    stack
        .machine
        .edit_draft(default_account(), DraftField::Amount, amount)
        .expect("edit amount");
    stack
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn transfer_round_trip_reports_one_hash_in_both_notifications() {
    let mut stack = connected_stack_with_draft("1.5").await;

    let run = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("submit");
    assert_eq!(run.status, TransferStatus::Submitted);
    let tx_hash = run.tx_hash.expect("submitted hash");
    assert_eq!(run.receiver, receiver_address());

    // Submission resets the draft for the next transfer.
    assert!(stack.machine.sessions()[0].draft().is_empty());

    let run = stack
        .machine
        .await_confirmation(default_account())
        .await
        .expect("confirm");
    assert_eq!(run.status, TransferStatus::Confirmed);
    assert_eq!(run.tx_hash, Some(tx_hash));

    let sent = stack.notifier.sent().expect("notifications");
    let descriptions: Vec<&str> = sent.iter().map(|n| n.description.as_str()).collect();
    assert!(descriptions.contains(&format!("Transaction Submited: {tx_hash}").as_str()));
    assert!(descriptions.contains(&format!("Transaction Succeed: {tx_hash}").as_str()));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn validation_failures_issue_no_provider_request() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    for (receiver, amount) in [
        ("", "1.5"),
        ("0x00000000000000000000000000000000000000CC", ""),
        ("not-an-address", "1.5"),
        ("0x00000000000000000000000000000000000000CC", "abc"),
        ("0x00000000000000000000000000000000000000CC", "0"),
        ("0x00000000000000000000000000000000000000CC", "-2"),
    ] {
        stack
            .machine
            .edit_draft(default_account(), DraftField::Receiver, receiver)
            .expect("edit receiver");
        stack
            .machine
            .edit_draft(default_account(), DraftField::Amount, amount)
            .expect("edit amount");

        let err = stack
            .machine
            .submit_transfer(default_account())
            .await
            .expect_err("must fail validation");
        assert!(matches!(err, WalletError::Validation(_)));

        // The draft survives for correction.
        let draft = stack.machine.sessions()[0].draft();
        assert_eq!(draft.receiver, receiver);
        assert_eq!(draft.amount, amount);
    }

    let log = stack.provider.debug_request_log().expect("request log");
    assert!(!log.iter().any(|m| m == "eth_sendTransaction"));
    assert!(stack.notifier.sent().expect("notifications").is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn second_submit_while_one_is_in_flight_is_rejected() {
    let mut stack = connected_stack_with_draft("1").await;
    stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("submit");

    stack
        .machine
        .edit_draft(
            default_account(),
            DraftField::Receiver,
            receiver_address().to_string(),
        )
        .expect("edit receiver");
    stack
        .machine
        .edit_draft(default_account(), DraftField::Amount, "2")
        .expect("edit amount");
    let err = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect_err("must reject concurrent run");
    assert!(matches!(err, WalletError::InvalidState(_)));

    let log = stack.provider.debug_request_log().expect("request log");
    let sends = log.iter().filter(|m| m.as_str() == "eth_sendTransaction").count();
    assert_eq!(sends, 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn rejected_send_fails_the_run_and_permits_a_fresh_one() {
    let mut stack = connected_stack_with_draft("1").await;
    stack
        .provider
        .debug_reject_send(Some(ProviderError::new(4001, "User rejected the request.")))
        .expect("arm rejection");

    let run = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("run is created, then fails");
    assert_eq!(run.status, TransferStatus::Failed);
    assert!(matches!(run.failure, Some(TransferFailure::Submission(_))));
    assert_eq!(run.tx_hash, None);
    // The attempt started, so the draft was consumed.
    assert!(stack.machine.sessions()[0].draft().is_empty());

    let sent = stack.notifier.drain().expect("notifications");
    assert!(sent
        .iter()
        .any(|n| n.description.starts_with("Transaction Failed:")));

    // A failed run is terminal; a fresh draft starts a fresh run.
    stack.provider.debug_reject_send(None).expect("disarm");
    stack
        .machine
        .edit_draft(
            default_account(),
            DraftField::Receiver,
            receiver_address().to_string(),
        )
        .expect("edit receiver");
    stack
        .machine
        .edit_draft(default_account(), DraftField::Amount, "1")
        .expect("edit amount");
    let retry = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("fresh run");
    assert_eq!(retry.status, TransferStatus::Submitted);
    assert!(retry.id > run.id);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn missing_signer_fails_without_submission() {
    let mut stack = connected_stack_with_draft("1").await;
    // The provider stops listing the account between connect and submit.
    stack
        .provider
        .debug_set_accounts(Vec::new())
        .expect("clear provider accounts");

    let run = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("run fails, not errors");
    assert_eq!(run.status, TransferStatus::Failed);
    assert_eq!(run.failure, Some(TransferFailure::NoSigner));
    assert_eq!(
        run.failure.as_ref().map(ToString::to_string).as_deref(),
        Some("no-signer")
    );

    let log = stack.provider.debug_request_log().expect("request log");
    assert!(!log.iter().any(|m| m == "eth_sendTransaction"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn stalled_receipt_times_out_into_a_failed_run() {
    let mut stack = connected_stack_with_draft("1").await;
    stack
        .provider
        .debug_stall_receipts(true)
        .expect("stall receipts");

    let run = stack
        .machine
        .submit_transfer(default_account())
        .await
        .expect("submit");
    let tx_hash = run.tx_hash.expect("submitted hash");

    let run = stack
        .machine
        .await_confirmation(default_account())
        .await
        .expect("terminal run");
    assert_eq!(run.status, TransferStatus::Failed);
    assert_eq!(run.failure, Some(TransferFailure::ConfirmationTimeout));
    // The hash stays on the record for external lookup.
    assert_eq!(run.tx_hash, Some(tx_hash));

    let sent = stack.notifier.sent().expect("notifications");
    let descriptions: Vec<&str> = sent.iter().map(|n| n.description.as_str()).collect();
    // The optimistic submitted signal is not retracted; the failure gets
    // its own signal.
    assert!(descriptions.contains(&format!("Transaction Submited: {tx_hash}").as_str()));
    assert!(descriptions.contains(&"Transaction Failed: timeout"));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn confirmation_without_a_submitted_run_is_rejected() {
    let mut stack = attach_machine().await;
    stack.machine.connect().await.expect("connect");

    let err = stack
        .machine
        .await_confirmation(default_account())
        .await
        .expect_err("nothing to confirm");
    assert!(matches!(err, WalletError::InvalidState(_)));
}
