//! Scripted chain for tests.
//!
//! Replies are ABI-encoded from tokens, so decoding goes through the same
//! path as a real node. Exact-calldata replies take precedence over
//! selector-wide replies; anything unscripted reverts.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes};

use crate::error::CallFailure;
use crate::evm::clients::RawCaller;
use crate::evm::gateway::parse_fragment;

#[derive(Debug, Clone)]
enum Reply {
    Data(Bytes),
    Revert,
}

#[derive(Default)]
pub struct MockChain {
    by_calldata: HashMap<(Address, Vec<u8>), Reply>,
    by_selector: HashMap<(Address, [u8; 4]), Reply>,
    calls: Mutex<Vec<(Address, Vec<u8>)>>,
}

fn selector(fragment: &str) -> [u8; 4] {
    match parse_fragment(fragment) {
        Ok(function) => function.short_signature(),
        Err(e) => panic!("mock fragment does not parse: {}", e),
    }
}

fn calldata(fragment: &str, args: &[Token]) -> Vec<u8> {
    match parse_fragment(fragment).map(|f| f.encode_input(args)) {
        Ok(Ok(data)) => data,
        _ => panic!("mock arguments do not encode for {}", fragment),
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call to `fragment`'s selector on `address`
    pub fn respond(mut self, address: Address, fragment: &str, output: Vec<Token>) -> Self {
        self.by_selector
            .insert((address, selector(fragment)), Reply::Data(encode(&output).into()));
        self
    }

    /// Answer only the call with exactly these arguments
    pub fn respond_to(mut self, address: Address, fragment: &str, args: Vec<Token>, output: Vec<Token>) -> Self {
        self.by_calldata
            .insert((address, calldata(fragment, &args)), Reply::Data(encode(&output).into()));
        self
    }

    /// Answer with raw return data
    pub fn respond_raw(mut self, address: Address, fragment: &str, output: Vec<u8>) -> Self {
        self.by_selector
            .insert((address, selector(fragment)), Reply::Data(output.into()));
        self
    }

    pub fn revert(mut self, address: Address, fragment: &str) -> Self {
        self.by_selector.insert((address, selector(fragment)), Reply::Revert);
        self
    }

    pub fn revert_to(mut self, address: Address, fragment: &str, args: Vec<Token>) -> Self {
        self.by_calldata
            .insert((address, calldata(fragment, &args)), Reply::Revert);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Number of calls made to `fragment`'s selector on `address`
    pub fn calls_to(&self, address: Address, fragment: &str) -> usize {
        let wanted = selector(fragment);
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(to, data)| *to == address && data.len() >= 4 && data[..4] == wanted)
                    .count()
            })
            .unwrap_or_default()
    }

    pub fn was_called(&self, address: Address, fragment: &str) -> bool {
        self.calls_to(address, fragment) > 0
    }
}

#[async_trait]
impl RawCaller for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, CallFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((to, data.to_vec()));
        }

        let reply = self.by_calldata.get(&(to, data.to_vec())).or_else(|| {
            let mut sel = [0u8; 4];
            if data.len() >= 4 {
                sel.copy_from_slice(&data[..4]);
            }
            self.by_selector.get(&(to, sel))
        });

        match reply {
            Some(Reply::Data(bytes)) => Ok(bytes.clone()),
            Some(Reply::Revert) => Err(CallFailure::Reverted("execution reverted".to_string())),
            None => Err(CallFailure::Reverted("execution reverted (unscripted)".to_string())),
        }
    }
}
