//! RPC method tables and request types
//!
//! Methods are closed enums per namespace with exhaustive attribute tables
//! (`requires_signer`, `requires_approval`). "Unsupported method" is an
//! exhaustiveness gap only at the table, never a scattered string branch.

use crate::chain::{ChainRef, Namespace};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Supported EVM (`eip155`) methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eip155Method {
    EthAccounts,
    EthRequestAccounts,
    EthBlockNumber,
    EthCall,
    EthChainId,
    EthEstimateGas,
    EthGasPrice,
    EthGetBalance,
    EthGetTransactionCount,
    EthGetTransactionReceipt,
    EthSendRawTransaction,
    EthSendTransaction,
    EthSign,
    EthSignTypedDataV3,
    EthSignTypedDataV4,
    PersonalSign,
    WalletSwitchEthereumChain,
}

impl Eip155Method {
    /// Look up a method by its wire name
    pub fn from_method(method: &str) -> Option<Self> {
        use Eip155Method::*;
        match method {
            "eth_accounts" => Some(EthAccounts),
            "eth_requestAccounts" => Some(EthRequestAccounts),
            "eth_blockNumber" => Some(EthBlockNumber),
            "eth_call" => Some(EthCall),
            "eth_chainId" => Some(EthChainId),
            "eth_estimateGas" => Some(EthEstimateGas),
            "eth_gasPrice" => Some(EthGasPrice),
            "eth_getBalance" => Some(EthGetBalance),
            "eth_getTransactionCount" => Some(EthGetTransactionCount),
            "eth_getTransactionReceipt" => Some(EthGetTransactionReceipt),
            "eth_sendRawTransaction" => Some(EthSendRawTransaction),
            "eth_sendTransaction" => Some(EthSendTransaction),
            "eth_sign" => Some(EthSign),
            "eth_signTypedData_v3" => Some(EthSignTypedDataV3),
            "eth_signTypedData_v4" => Some(EthSignTypedDataV4),
            "personal_sign" => Some(PersonalSign),
            "wallet_switchEthereumChain" => Some(WalletSwitchEthereumChain),
            _ => None,
        }
    }

    /// Wire name of this method
    pub fn as_str(&self) -> &'static str {
        use Eip155Method::*;
        match self {
            EthAccounts => "eth_accounts",
            EthRequestAccounts => "eth_requestAccounts",
            EthBlockNumber => "eth_blockNumber",
            EthCall => "eth_call",
            EthChainId => "eth_chainId",
            EthEstimateGas => "eth_estimateGas",
            EthGasPrice => "eth_gasPrice",
            EthGetBalance => "eth_getBalance",
            EthGetTransactionCount => "eth_getTransactionCount",
            EthGetTransactionReceipt => "eth_getTransactionReceipt",
            EthSendRawTransaction => "eth_sendRawTransaction",
            EthSendTransaction => "eth_sendTransaction",
            EthSign => "eth_sign",
            EthSignTypedDataV3 => "eth_signTypedData_v3",
            EthSignTypedDataV4 => "eth_signTypedData_v4",
            PersonalSign => "personal_sign",
            WalletSwitchEthereumChain => "wallet_switchEthereumChain",
        }
    }

    /// Whether the method needs a sender address configured for the namespace
    pub fn requires_signer(&self) -> bool {
        use Eip155Method::*;
        match self {
            EthSendTransaction | EthSendRawTransaction | EthSign | EthSignTypedDataV3
            | EthSignTypedDataV4 | PersonalSign => true,
            EthAccounts | EthRequestAccounts | EthBlockNumber | EthCall | EthChainId
            | EthEstimateGas | EthGasPrice | EthGetBalance | EthGetTransactionCount
            | EthGetTransactionReceipt | WalletSwitchEthereumChain => false,
        }
    }

    /// Whether the method must pass through a host approval before execution
    /// when it arrives from an external dApp
    pub fn requires_approval(&self) -> bool {
        use Eip155Method::*;
        match self {
            EthSendTransaction | EthSendRawTransaction | EthSign | EthSignTypedDataV3
            | EthSignTypedDataV4 | PersonalSign | EthRequestAccounts
            | WalletSwitchEthereumChain => true,
            EthAccounts | EthBlockNumber | EthCall | EthChainId | EthEstimateGas | EthGasPrice
            | EthGetBalance | EthGetTransactionCount | EthGetTransactionReceipt => false,
        }
    }
}

impl fmt::Display for Eip155Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported Solana methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolanaMethod {
    SolGetBalance,
    SolGetLatestBlockhash,
    SolSignAllTransactions,
    SolSignAndSendTransaction,
    SolSignMessage,
    SolSignTransaction,
}

impl SolanaMethod {
    /// Look up a method by its wire name
    pub fn from_method(method: &str) -> Option<Self> {
        use SolanaMethod::*;
        match method {
            "sol_getBalance" => Some(SolGetBalance),
            "sol_getLatestBlockhash" => Some(SolGetLatestBlockhash),
            "sol_signAllTransactions" => Some(SolSignAllTransactions),
            "sol_signAndSendTransaction" => Some(SolSignAndSendTransaction),
            "sol_signMessage" => Some(SolSignMessage),
            "sol_signTransaction" => Some(SolSignTransaction),
            _ => None,
        }
    }

    /// Wire name of this method
    pub fn as_str(&self) -> &'static str {
        use SolanaMethod::*;
        match self {
            SolGetBalance => "sol_getBalance",
            SolGetLatestBlockhash => "sol_getLatestBlockhash",
            SolSignAllTransactions => "sol_signAllTransactions",
            SolSignAndSendTransaction => "sol_signAndSendTransaction",
            SolSignMessage => "sol_signMessage",
            SolSignTransaction => "sol_signTransaction",
        }
    }

    /// Whether the method needs a sender address configured for the namespace
    pub fn requires_signer(&self) -> bool {
        use SolanaMethod::*;
        match self {
            SolSignAllTransactions | SolSignAndSendTransaction | SolSignMessage
            | SolSignTransaction => true,
            SolGetBalance | SolGetLatestBlockhash => false,
        }
    }

    /// Whether the method must pass through a host approval before execution
    /// when it arrives from an external dApp
    pub fn requires_approval(&self) -> bool {
        self.requires_signer()
    }
}

impl fmt::Display for SolanaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method resolved against its namespace table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Eip155(Eip155Method),
    Solana(SolanaMethod),
}

impl Method {
    /// Resolve a wire method name against the namespace's supported set
    pub fn resolve(namespace: Namespace, method: &str) -> Option<Self> {
        match namespace {
            Namespace::Eip155 => Eip155Method::from_method(method).map(Method::Eip155),
            Namespace::Solana => SolanaMethod::from_method(method).map(Method::Solana),
        }
    }

    /// Wire name of this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Eip155(m) => m.as_str(),
            Method::Solana(m) => m.as_str(),
        }
    }

    /// Whether the method needs a sender address configured for the namespace
    pub fn requires_signer(&self) -> bool {
        match self {
            Method::Eip155(m) => m.requires_signer(),
            Method::Solana(m) => m.requires_signer(),
        }
    }

    /// Whether the method must pass through a host approval before execution
    /// when it arrives from an external dApp
    pub fn requires_approval(&self) -> bool {
        match self {
            Method::Eip155(m) => m.requires_approval(),
            Method::Solana(m) => m.requires_approval(),
        }
    }
}

/// A chain-scoped RPC request
///
/// Constructed per call, immutable, consumed exactly once by the Provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Target chain
    pub chain: ChainRef,
    /// Wire method name
    pub method: String,
    /// Positional parameters
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Create a new request
    pub fn new(chain: ChainRef, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            chain,
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_resolution() {
        assert_eq!(
            Method::resolve(Namespace::Eip155, "eth_sendTransaction"),
            Some(Method::Eip155(Eip155Method::EthSendTransaction))
        );
        assert_eq!(
            Method::resolve(Namespace::Solana, "sol_signMessage"),
            Some(Method::Solana(SolanaMethod::SolSignMessage))
        );

        // Methods never resolve across namespaces
        assert_eq!(Method::resolve(Namespace::Solana, "eth_sendTransaction"), None);
        assert_eq!(Method::resolve(Namespace::Eip155, "sol_signMessage"), None);
        assert_eq!(Method::resolve(Namespace::Eip155, "eth_mine"), None);
    }

    #[test]
    fn test_signing_class_methods_require_signer() {
        for name in [
            "eth_sendTransaction",
            "eth_sign",
            "personal_sign",
            "eth_signTypedData_v3",
            "eth_signTypedData_v4",
        ] {
            let method = Method::resolve(Namespace::Eip155, name).unwrap();
            assert!(method.requires_signer(), "{} should require a signer", name);
            assert!(method.requires_approval());
        }

        for name in ["eth_getBalance", "eth_chainId", "eth_blockNumber"] {
            let method = Method::resolve(Namespace::Eip155, name).unwrap();
            assert!(!method.requires_signer(), "{} is a read", name);
        }
    }

    #[test]
    fn test_wire_names_round_trip() {
        for method in [
            Eip155Method::EthSignTypedDataV4,
            Eip155Method::WalletSwitchEthereumChain,
            Eip155Method::PersonalSign,
        ] {
            assert_eq!(Eip155Method::from_method(method.as_str()), Some(method));
        }

        for method in [
            SolanaMethod::SolSignAndSendTransaction,
            SolanaMethod::SolGetLatestBlockhash,
        ] {
            assert_eq!(SolanaMethod::from_method(method.as_str()), Some(method));
        }
    }
}
