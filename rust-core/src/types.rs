// Identifiers, entity records and deterministic key derivation.
// Keys hash a domain tag plus a length-prefixed field encoding, so two different
// (airline, code, departure) triples never share a preimage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

pub type Hash = [u8; 32];

/// Smallest currency unit (gwei under the default policies).
pub type Amount = u64;

pub const ONE_ETHER: Amount = 1_000_000_000;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub Hash);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &hex::encode(self.0)[..8])
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                <Hash as hex::FromHex>::from_hex(raw).map($name)
            }
        }

        // Hex strings (not byte arrays) so ids can key JSON maps.
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Account identity of an airline, passenger, oracle or application caller.
    Address
);
hex_id!(
    /// Deterministic flight identity, see [`flight_key`].
    FlightKey
);
hex_id!(
    /// Oracle request identity, see [`request_key`].
    RequestKey
);

impl Address {
    /// Stable address derived from a human label; handy for fixtures and genesis files.
    pub fn from_label(label: &str) -> Self {
        let mut h = Sha256::new();
        h.update(b"flightsure/address");
        h.update(label.as_bytes());
        Address(h.finalize().into())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    #[default]
    Unknown,
    OnTime,
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl FlightStatus {
    pub fn code(self) -> u8 {
        match self {
            FlightStatus::Unknown => 0,
            FlightStatus::OnTime => 10,
            FlightStatus::LateAirline => 20,
            FlightStatus::LateWeather => 30,
            FlightStatus::LateTechnical => 40,
            FlightStatus::LateOther => 50,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(FlightStatus::Unknown),
            10 => Some(FlightStatus::OnTime),
            20 => Some(FlightStatus::LateAirline),
            30 => Some(FlightStatus::LateWeather),
            40 => Some(FlightStatus::LateTechnical),
            50 => Some(FlightStatus::LateOther),
            _ => None,
        }
    }

    /// Only a delay attributed to the airline pays out.
    pub fn triggers_payout(self) -> bool {
        self == FlightStatus::LateAirline
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    /// Registration order, starting at 1.
    pub id: u32,
    pub funded: bool,
    pub accepted: bool,
    /// Elector airline ids; a set, so nobody is counted twice.
    pub votes: BTreeSet<u32>,
    pub flights: Vec<FlightKey>,
}

impl Airline {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            funded: false,
            accepted: false,
            votes: BTreeSet::new(),
            flights: Vec::new(),
        }
    }

    pub fn is_operable(&self) -> bool {
        self.funded && self.accepted
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub id: u64,
    pub airline: Address,
    pub code: String,
    /// Scheduled departure, unix seconds.
    pub departure: u64,
    pub status: FlightStatus,
    pub updated_at: u64,
}

impl Flight {
    pub fn key(&self) -> FlightKey {
        flight_key(&self.airline, &self.code, self.departure)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceState {
    Valid,
    Expired,
    Refunded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    pub id: u64,
    pub flight: FlightKey,
    pub passenger: Address,
    pub amount: Amount,
    pub state: InsuranceState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub indexes: [u8; 3],
}

impl Oracle {
    pub fn has_index(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRequest {
    pub index: u8,
    pub airline: Address,
    pub code: String,
    pub departure: u64,
    pub requester: Address,
    pub open: bool,
    /// Status code -> oracles that reported it.
    pub responses: BTreeMap<u8, BTreeSet<Address>>,
    pub finalized: Option<FlightStatus>,
}

impl OracleRequest {
    pub fn new(index: u8, airline: Address, code: &str, departure: u64, requester: Address) -> Self {
        Self {
            index,
            airline,
            code: code.to_string(),
            departure,
            requester,
            open: true,
            responses: BTreeMap::new(),
            finalized: None,
        }
    }

    pub fn key(&self) -> RequestKey {
        request_key(self.index, &self.airline, &self.code, self.departure)
    }

    pub fn reports_for(&self, status: FlightStatus) -> usize {
        self.responses
            .get(&status.code())
            .map(BTreeSet::len)
            .unwrap_or(0)
    }
}

fn hash_flight_fields(h: &mut Sha256, airline: &Address, code: &str, departure: u64) {
    h.update(airline.0);
    h.update((code.len() as u64).to_le_bytes());
    h.update(code.as_bytes());
    h.update(departure.to_le_bytes());
}

pub fn flight_key(airline: &Address, code: &str, departure: u64) -> FlightKey {
    let mut h = Sha256::new();
    h.update(b"flightsure/flight");
    hash_flight_fields(&mut h, airline, code, departure);
    FlightKey(h.finalize().into())
}

pub fn request_key(index: u8, airline: &Address, code: &str, departure: u64) -> RequestKey {
    let mut h = Sha256::new();
    h.update(b"flightsure/oracle-request");
    h.update([index]);
    hash_flight_fields(&mut h, airline, code, departure);
    RequestKey(h.finalize().into())
}
