//! Venue registry: resolves venue addresses to their adapters

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;
use tracing::debug;

use super::Venue;
use crate::shared::errors::ArbitrageError;

/// Registered venues, kept in registration order
#[derive(Default)]
pub struct VenueRegistry {
    venues: HashMap<Pubkey, Box<dyn Venue>>,
    order: Vec<Pubkey>,
}

impl VenueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its address
    pub fn register(&mut self, venue: Box<dyn Venue>) -> Result<(), ArbitrageError> {
        let address = venue.address();
        if address == Pubkey::default() {
            return Err(ArbitrageError::InvalidConfig(format!("venue {} has zero address", venue.name())));
        }
        if self.venues.contains_key(&address) {
            return Err(ArbitrageError::InvalidConfig(format!("venue {} registered twice", address)));
        }
        debug!("📋 Registered venue {} ({}) at {}", venue.name(), venue.label(), address);
        self.order.push(address);
        self.venues.insert(address, venue);
        Ok(())
    }

    pub fn get(&self, address: &Pubkey) -> Option<&dyn Venue> {
        self.venues.get(address).map(|v| v.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Venue> + '_ {
        self.order.iter().filter_map(move |a| self.get(a))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|v| (v.name().to_string(), v.address())))
            .finish()
    }
}
