use crate::repository::{BridgeEvent, NetworkCount};
use crate::tally::Tally;
use std::cmp::Reverse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCount {
    pub address: String,
    pub count: u64,
}

impl AddressCount {
    /// `0x1234…abcd`
    pub fn short_label(&self) -> String {
        shorten(&self.address)
    }
}

pub fn shorten(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return value.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

/// Addresses that started the most bridges from `origin_chain`.
/// Addresses are lower-cased before counting; blanks are ignored; ties keep
/// first-seen order.
pub fn top_addresses_by_origin_chain(
    events: &[BridgeEvent],
    origin_chain: u32,
    n: usize,
) -> Vec<AddressCount> {
    let mut tally: Tally<String> = Tally::new();

    for event in events
        .iter()
        .filter(|e| e.origin_network == Some(origin_chain))
    {
        let address = event
            .origin_address
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if address.is_empty() {
            continue;
        }
        tally.increment(address);
    }

    tally
        .into_ranked()
        .into_iter()
        .take(n)
        .map(|(address, count)| AddressCount { address, count })
        .collect()
}

/// Per-network event counts merged by network id, largest first, ties in
/// first-seen order. Rows without a numeric network are dropped.
pub fn rank_networks(rows: &[NetworkCount], n: Option<usize>) -> Vec<(u32, u64)> {
    let mut tally: Tally<u32> = Tally::new();
    for row in rows {
        if let Some(network) = row.network {
            tally.add(network, row.count);
        }
    }

    let ranked = tally.into_ranked();
    match n {
        Some(n) => ranked.into_iter().take(n).collect(),
        None => ranked,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkActivity {
    pub network: u32,
    pub bridges: u64,
    pub claims: u64,
}

impl NetworkActivity {
    pub fn total(&self) -> u64 {
        self.bridges + self.claims
    }
}

/// Bridge and claim counts side by side, busiest network first. Ties keep
/// bridge ranking order, then claim-only networks in claim ranking order.
pub fn network_activity(
    bridges: &[NetworkCount],
    claims: &[NetworkCount],
) -> Vec<NetworkActivity> {
    let claim_ranking = rank_networks(claims, None);
    let mut activity: Vec<NetworkActivity> = rank_networks(bridges, None)
        .into_iter()
        .map(|(network, bridges)| NetworkActivity {
            network,
            bridges,
            claims: 0,
        })
        .collect();

    for (network, claims) in claim_ranking {
        match activity.iter_mut().find(|a| a.network == network) {
            Some(existing) => existing.claims = claims,
            None => activity.push(NetworkActivity {
                network,
                bridges: 0,
                claims,
            }),
        }
    }

    activity.sort_by_key(|a| Reverse(a.total()));
    activity
}

/// Most recent events first.
pub fn latest_events(events: &[BridgeEvent], limit: usize) -> Vec<BridgeEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|e| Reverse(e.block_number));
    sorted.truncate(limit);
    sorted
}
