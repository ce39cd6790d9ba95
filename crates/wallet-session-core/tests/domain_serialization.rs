use alloy::primitives::{Address, B256, U256};

use wallet_session_core::{
    ConnectionState, ConnectionStatus, TransferFailure, TransferRun, TransferStatus,
};

#[test]
fn connection_state_round_trips_through_json() {
    let state = ConnectionState {
        status: ConnectionStatus::Connected,
        accounts: vec![
            "0x00000000000000000000000000000000000000AA"
                .parse::<Address>()
                .expect("account"),
        ],
        chain_id: Some(137),
        chain_name: Some("Polygon Mainnet".to_owned()),
    };
    let json = serde_json::to_string(&state).expect("serialize");
    let back: ConnectionState = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, state);
}

#[test]
fn transfer_run_round_trips_through_json() {
    let run = TransferRun {
        id: 3,
        account: Address::ZERO,
        receiver: "0x00000000000000000000000000000000000000CC"
            .parse()
            .expect("receiver"),
        amount_wei: U256::from(1_500_000_000_000_000_000u64),
        status: TransferStatus::Confirmed,
        tx_hash: Some(B256::repeat_byte(0x42)),
        failure: None,
    };
    let json = serde_json::to_string(&run).expect("serialize");
    let back: TransferRun = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, run);
    assert!(back.is_terminal());
}

#[test]
fn transfer_failure_reasons_render_stable_strings() {
    assert_eq!(TransferFailure::NoSigner.to_string(), "no-signer");
    assert_eq!(TransferFailure::ConfirmationTimeout.to_string(), "timeout");
    assert!(TransferFailure::Submission("nonce too low".to_owned())
        .to_string()
        .contains("nonce too low"));
}
