//! CAIP-2 chain ids (`namespace:reference`) and CAIP-10 accounts
//! (`namespace:reference:address`).

/// Reference half of a chain id: `solana:5eyk...` → `5eyk...`
pub fn chain_reference(chain: &str) -> Option<&str> {
    let (namespace, reference) = chain.split_once(':')?;
    if namespace.is_empty() || reference.is_empty() || reference.contains(':') {
        return None;
    }
    Some(reference)
}

/// Namespace half of a chain id, or the whole key when it carries no reference
pub fn chain_namespace(chain: &str) -> &str {
    chain.split_once(':').map_or(chain, |(namespace, _)| namespace)
}

/// Address part of a CAIP-10 account: the third `:` segment
pub fn account_address(account: &str) -> Option<&str> {
    account.split(':').nth(2).filter(|address| !address.is_empty())
}

/// Chain part of a CAIP-10 account
pub fn account_chain(account: &str) -> Option<&str> {
    let (chain, address) = account.rsplit_once(':')?;
    (chain_reference(chain).is_some() && !address.is_empty()).then_some(chain)
}

pub fn format_account(chain: &str, address: &str) -> String {
    format!("{chain}:{address}")
}
