//! On-chain claim: call `claimBox(fid)` on the box contract and wait for the receipt.

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::ClaimStrategy;
use crate::config::{AppConfig, StrategyKind};
use crate::domain::{ClaimOutcome, Identity};
use crate::error::{ClaimerError, Result};

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IBoxClaim {
        /// Open the box for a claimant; reverts while the cooldown is active
        function claimBox(uint256 fid) external;
    }
}

pub struct OnchainClaimer {
    signer: PrivateKeySigner,
    rpc_url: Url,
    contract: Address,
    receipt_timeout: Duration,
}

impl OnchainClaimer {
    pub fn new(
        private_key: &str,
        rpc_url: &str,
        contract: &str,
        receipt_timeout: Duration,
    ) -> Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| ClaimerError::Wallet(format!("Invalid private key: {}", e)))?;
        let rpc_url = rpc_url
            .trim()
            .parse()
            .map_err(|e| ClaimerError::AddressParsing(format!("Invalid RPC URL: {}", e)))?;
        let contract = contract
            .trim()
            .parse()
            .map_err(|e| ClaimerError::AddressParsing(format!("Invalid contract address: {}", e)))?;

        Ok(Self {
            signer,
            rpc_url,
            contract,
            receipt_timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let required = |v: &Option<String>, name: &str| {
            v.clone()
                .ok_or_else(|| ClaimerError::Validation(format!("{} is required", name)))
        };
        Self::new(
            &required(&config.wallet.private_key, "wallet.private_key")?,
            &required(&config.rpc.url, "rpc.url")?,
            &required(&config.claim.contract_address, "claim.contract_address")?,
            config.claim.receipt_timeout(),
        )
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    async fn send_claim(&self, fid: U256) -> Result<ClaimOutcome> {
        let wallet = EthereumWallet::from(self.signer.clone());
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());

        // A wallet without gas can only produce failed submissions.
        let balance = provider
            .get_balance(self.signer.address())
            .await
            .map_err(|e| ClaimerError::Rpc(format!("Failed to read wallet balance: {}", e)))?;
        if balance.is_zero() {
            return Err(ClaimerError::Rpc(format!(
                "wallet {} has no native balance for gas",
                self.signer.address()
            )));
        }
        debug!("Claim wallet {} balance: {} wei", self.signer.address(), balance);

        let contract = IBoxClaim::new(self.contract, provider);
        let pending = contract
            .claimBox(fid)
            .send()
            .await
            .map_err(|e| ClaimerError::Rpc(format!("claimBox tx failed: {}", e)))?;
        let tx_hash = *pending.tx_hash();
        info!("claimBox submitted: {:?}", tx_hash);

        let receipt = tokio::time::timeout(self.receipt_timeout, pending.get_receipt())
            .await
            .map_err(|_| ClaimerError::Timeout {
                operation: format!("receipt for {:?}", tx_hash),
                elapsed_secs: self.receipt_timeout.as_secs(),
            })?
            .map_err(|e| ClaimerError::Rpc(format!("Tx confirmation failed: {}", e)))?;

        if receipt.status() {
            Ok(ClaimOutcome::Success {
                reference: Some(format!("{:?}", receipt.transaction_hash())),
            })
        } else {
            Ok(ClaimOutcome::Rejected {
                reason: format!("transaction {:?} reverted", receipt.transaction_hash()),
            })
        }
    }
}

#[async_trait]
impl ClaimStrategy for OnchainClaimer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Onchain
    }

    async fn attempt_claim(&self, identity: &Identity) -> ClaimOutcome {
        let Some(fid) = identity.as_u64() else {
            return ClaimOutcome::TransportFailure {
                reason: format!("fid '{}' is not numeric", identity),
            };
        };

        match self.send_claim(U256::from(fid)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("On-chain claim failed: {}", e);
                ClaimOutcome::TransportFailure {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const SIGNER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const TX_HASH: &str = "0x4e3a3754410177e6937ef1f84bba68ea139e8d1a2258c5f85db9f1cd715a1bdd";
    const BLOCK_HASH: &str = "0x8f3f8c3b2a1e0d9c8b7a69584736251403f2e1d0c9b8a7968574635241302f1e";

    fn claimer(rpc: &str) -> OnchainClaimer {
        OnchainClaimer::new(TEST_KEY, rpc, CONTRACT, Duration::from_secs(5)).unwrap()
    }

    fn receipt(status: &str) -> Value {
        json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x186a0",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": BLOCK_HASH,
            "blockNumber": "0x10",
            "gasUsed": "0x186a0",
            "effectiveGasPrice": "0x77359400",
            "from": SIGNER,
            "to": CONTRACT,
            "contractAddress": null
        })
    }

    /// Minimal JSON-RPC node. `receipt_status` of `None` means the
    /// transaction is never mined.
    async fn rpc_node(balance: &'static str, receipt_status: Option<&'static str>) -> MockServer {
        let server = MockServer::start().await;
        let responder = move |req: &Request| {
            let body: Value = serde_json::from_slice(&req.body).unwrap_or(Value::Null);
            let id = body["id"].clone();
            let result = match body["method"].as_str().unwrap_or_default() {
                "eth_getBalance" => json!(balance),
                "eth_chainId" => json!("0x279f"),
                "eth_getTransactionCount" => json!("0x0"),
                "eth_estimateGas" => json!("0x186a0"),
                "eth_gasPrice" | "eth_maxPriorityFeePerGas" => json!("0x3b9aca00"),
                "eth_feeHistory" => json!({
                    "oldestBlock": "0xf",
                    "baseFeePerGas": ["0x3b9aca00", "0x3b9aca00"],
                    "gasUsedRatio": [0.5],
                    "reward": [["0x3b9aca00"]]
                }),
                "eth_sendRawTransaction" => json!(TX_HASH),
                "eth_getTransactionReceipt" => receipt_status.map(receipt).unwrap_or(Value::Null),
                "eth_blockNumber" => json!("0x10"),
                "eth_newBlockFilter" => json!("0x1"),
                "eth_getFilterChanges" => json!([]),
                other => {
                    return ResponseTemplate::new(200).set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": { "code": -32601, "message": format!("{other} not supported") }
                    }))
                }
            };
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result
            }))
        };
        Mock::given(method("POST"))
            .respond_with(responder)
            .mount(&server)
            .await;
        server
    }

    fn claimer_for(server: &MockServer, receipt_timeout: Duration) -> OnchainClaimer {
        OnchainClaimer::new(TEST_KEY, &server.uri(), CONTRACT, receipt_timeout).unwrap()
    }

    #[tokio::test]
    async fn mined_receipt_is_success_with_tx_hash() {
        let server = rpc_node("0xde0b6b3a7640000", Some("0x1")).await;
        let outcome = claimer_for(&server, Duration::from_secs(5))
            .attempt_claim(&Identity::new("4242"))
            .await;
        assert_eq!(
            outcome,
            ClaimOutcome::Success {
                reference: Some(TX_HASH.to_string())
            }
        );
    }

    #[tokio::test]
    async fn reverted_receipt_is_rejected() {
        let server = rpc_node("0xde0b6b3a7640000", Some("0x0")).await;
        let outcome = claimer_for(&server, Duration::from_secs(5))
            .attempt_claim(&Identity::new("4242"))
            .await;
        match outcome {
            ClaimOutcome::Rejected { reason } => {
                assert!(reason.contains("reverted"), "unexpected reason: {reason}")
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn receipt_that_never_arrives_is_transport_failure() {
        let server = rpc_node("0xde0b6b3a7640000", None).await;
        let started = std::time::Instant::now();
        let outcome = claimer_for(&server, Duration::from_millis(500))
            .attempt_claim(&Identity::new("4242"))
            .await;
        assert!(
            matches!(outcome, ClaimOutcome::TransportFailure { .. }),
            "got {outcome:?}"
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn empty_wallet_never_submits() {
        let server = rpc_node("0x0", Some("0x1")).await;
        let outcome = claimer_for(&server, Duration::from_secs(5))
            .attempt_claim(&Identity::new("4242"))
            .await;
        match outcome {
            ClaimOutcome::TransportFailure { reason } => {
                assert!(reason.contains("no native balance"), "unexpected reason: {reason}")
            }
            other => panic!("expected transport failure, got {other:?}"),
        }

        let requests = server.received_requests().await.unwrap_or_default();
        assert!(requests.iter().all(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap_or(Value::Null);
            body["method"] != "eth_sendRawTransaction"
        }));
    }

    #[test]
    fn construction_parses_signer_and_contract() {
        let claimer = claimer("http://127.0.0.1:8545");
        assert_eq!(
            claimer.signer_address(),
            SIGNER.parse::<Address>().unwrap()
        );
        assert_eq!(claimer.kind(), StrategyKind::Onchain);
    }

    #[test]
    fn construction_rejects_bad_inputs() {
        assert!(matches!(
            OnchainClaimer::new("zz", "http://127.0.0.1:8545", CONTRACT, Duration::from_secs(5)),
            Err(ClaimerError::Wallet(_))
        ));
        assert!(matches!(
            OnchainClaimer::new(TEST_KEY, "http://127.0.0.1:8545", "0x1234", Duration::from_secs(5)),
            Err(ClaimerError::AddressParsing(_))
        ));
        assert!(matches!(
            OnchainClaimer::new(TEST_KEY, "not a url", CONTRACT, Duration::from_secs(5)),
            Err(ClaimerError::AddressParsing(_))
        ));
    }

    #[tokio::test]
    async fn non_numeric_fid_never_reaches_the_chain() {
        let outcome = claimer("http://127.0.0.1:1")
            .attempt_claim(&Identity::new("alice"))
            .await;
        assert!(matches!(outcome, ClaimOutcome::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn unreachable_rpc_is_transport_failure() {
        let outcome = claimer("http://127.0.0.1:1")
            .attempt_claim(&Identity::new("4242"))
            .await;
        match outcome {
            ClaimOutcome::TransportFailure { reason } => {
                assert!(reason.contains("balance"), "unexpected reason: {reason}")
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }
}
