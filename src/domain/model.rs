use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encode-side input: the reservation aggregate supplied by the caller.
// Read-only to the codec; never mutated or persisted here.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub record_locator: String,
    pub created_date: NaiveDateTime,
    #[serde(default)]
    pub booking_channel: Option<String>,
    #[serde(default)]
    pub agency_code: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub passengers: Vec<Passenger>,
    #[serde(default)]
    pub flights: Vec<Flight>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub passenger_type: Option<String>,
    #[serde(default)]
    pub documents: Vec<TravelDocument>,
    #[serde(default)]
    pub bags: Vec<Baggage>,
    #[serde(default)]
    pub seats: Vec<SeatAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub flight_number: String,
    pub airline_code: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date: NaiveDateTime,
    pub arrival_date: NaiveDateTime,
    #[serde(default = "default_service_class")]
    pub service_class: String,
    #[serde(default)]
    pub operating_carrier: Option<String>,
    /// Operating carrier's own flight number; falls back to `flight_number`
    /// for codeshares when absent.
    #[serde(default)]
    pub operating_flight_number: Option<String>,
    #[serde(default = "default_segment_number")]
    pub segment_number: u32,
}

fn default_service_class() -> String {
    "Y".to_string()
}

fn default_segment_number() -> u32 {
    1
}

impl Flight {
    pub fn operating_code(&self) -> &str {
        match &self.operating_carrier {
            Some(code) if !code.is_empty() => code,
            _ => &self.airline_code,
        }
    }

    pub fn operating_flight(&self) -> &str {
        match &self.operating_flight_number {
            Some(num) if !num.is_empty() => num,
            _ => &self.flight_number,
        }
    }

    pub fn is_codeshare(&self) -> bool {
        matches!(&self.operating_carrier,
            Some(code) if !code.is_empty() && code != &self.airline_code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelDocument {
    pub document_type: String,
    pub document_number: String,
    pub nationality: String,
    #[serde(default)]
    pub issuing_country: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baggage {
    pub bag_tag_number: String,
    #[serde(default)]
    pub number_of_pieces: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub seat_number: String,
    #[serde(default)]
    pub segment_number: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_type: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Decode-side output: the manifest assembled from a wire message.
// Passenger records are exclusively owned by the manifest that produced them.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub message_reference: Option<String>,
    pub message_type: Option<String>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub interchange_reference: Option<String>,
    pub declared_passenger_count: Option<u64>,
    pub declared_segment_count: Option<u64>,
    pub passengers: Vec<ManifestPassenger>,
    /// Unsupported segment tags seen and skipped during decode.
    pub unknown_segments: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestPassenger {
    pub surname: String,
    pub given_name: String,
    pub party_reference: Option<String>,
    pub documents: Vec<DocumentRecord>,
    pub seat: Option<String>,
    pub bags: Vec<BaggageRecord>,
    pub embarkation: Option<String>,
    pub disembarkation: Option<String>,
    pub other_locations: Vec<LocationRecord>,
}

impl ManifestPassenger {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.surname, self.given_name);
        name.trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Raw wire code, retained verbatim even when unrecognised.
    pub type_code: String,
    pub kind: DocumentKind,
    pub number: String,
    pub nationality: Option<String>,
    pub issuing_country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Passport,
    Visa,
    IdentityCard,
    Other,
}

impl DocumentKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "P" => DocumentKind::Passport,
            "V" => DocumentKind::Visa,
            "I" => DocumentKind::IdentityCard,
            _ => DocumentKind::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaggageRecord {
    pub tag: String,
    pub pieces: Option<u32>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub qualifier: String,
    pub value: String,
}
