use crate::config::{CodecConfig, NameOrder};
use crate::core::segment::{qualifiers, Segment};
use crate::core::tokenizer::write_message;
use crate::core::validator;
use crate::domain::model::{Flight, Reservation};
use crate::utils::error::{CodecError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Serialized message plus the counts computed during emission, for the
/// caller to surface (file names, response metadata).
#[derive(Debug)]
pub struct EncodeOutcome {
    pub edifact: String,
    pub passenger_count: usize,
    pub flight_count: usize,
    pub segment_count: u64,
}

/// Encodes a reservation into one passenger-manifest message. Segment
/// groups are gated by the configured flags; every trailer count is
/// recomputed from the segments actually emitted, never taken from caller
/// metadata.
pub fn encode(reservation: &Reservation, config: &CodecConfig) -> Result<EncodeOutcome> {
    let flags = &config.flags;
    let mut flights: Vec<&Flight> = reservation.flights.iter().collect();
    flights.sort_by_key(|f| f.segment_number);
    let reporting_flight = flights.first().copied();

    let sender = reporting_flight
        .map(|f| f.airline_code.as_str())
        .unwrap_or("XX");
    let created = reservation.created_date;
    let message_reference = compact_timestamp(created, "message_reference")?;
    let interchange_reference = format!("{}{}", message_reference, reservation.record_locator);
    let header_date = short_date(created.date(), "created_date")?;
    let header_time = time_of(created);

    let mut segments: Vec<Segment> = Vec::new();

    // UNB - interchange header
    segments.push(
        Segment::new("UNB")
            .with_composite(["IATA", "1"])
            .with_simple(sender)
            .with_simple(config.receiver.clone())
            .with_composite([header_date.clone(), header_time.clone()])
            .with_simple(interchange_reference.clone())
            .with_simple("PAXLST"),
    );

    // UNG - functional group header
    segments.push(
        Segment::new("UNG")
            .with_simple("PAXLST")
            .with_simple(sender)
            .with_simple(config.receiver.clone())
            .with_composite([header_date.clone(), header_time.clone()])
            .with_simple(interchange_reference.clone())
            .with_simple("UN")
            .with_composite(["D", "05B"]),
    );

    // UNH - message header; the trailer count convention starts here
    let unh_index = segments.len();
    segments.push(
        Segment::new("UNH")
            .with_simple(message_reference.clone())
            .with_composite(["PAXLST", "D", "05B", "UN", "IATA"])
            .with_simple(header_flight_info(reporting_flight)?),
    );

    // ORG - originator of the message
    segments.push(Segment::new("ORG").with_simple(sender));

    // DAT - last transaction date/time
    segments.push(Segment::new("DAT").with_composite([
        "700".to_string(),
        full_date(created.date(), "created_date")?,
        header_time.clone(),
    ]));

    // RCI - reservation control information
    segments.push(Segment::new("RCI").with_composite([
        sender.to_string(),
        reservation.record_locator.clone(),
        String::new(),
        header_date.clone(),
        header_time.clone(),
    ]));

    if flags.has_phones {
        if let Some(phone) = non_empty_field(&reservation.contact_phone) {
            segments.push(free_text(format!("{} PHONE {}", sender, phone.to_uppercase())));
        }
        if let Some(email) = non_empty_field(&reservation.contact_email) {
            segments.push(free_text(format!("{} EMAIL {}", sender, email.to_uppercase())));
        }
    }

    if flags.has_agency {
        let agency = non_empty_field(&reservation.agency_code).unwrap_or("TTY");
        segments.push(Segment::new("ORG").with_composite([sender, agency]));
    }

    if flags.has_payment {
        for payment in &reservation.payments {
            segments.push(payment_segment(payment, flags.has_credit_card));
        }
    }

    // TVL - reporting flight, plus onward legs for thru-flight itineraries
    let mut flight_count = 0usize;
    let emitted_flights: Vec<&Flight> = if flags.is_thru_flight {
        flights.clone()
    } else {
        reporting_flight.into_iter().collect()
    };
    for flight in emitted_flights {
        segments.push(flight_segment(flight, flags.is_codeshare)?);
        flight_count += 1;
        if flags.is_codeshare && flight.is_codeshare() {
            segments.push(
                Segment::new("TRA")
                    .with_simple(flight.operating_code())
                    .with_composite([flight.operating_flight(), "D"]),
            );
        }
    }

    // one segment group per passenger
    let mut passenger_count = 0usize;
    for (index, passenger) in reservation.passengers.iter().enumerate() {
        segments.push(name_segment(index + 1, passenger, config.name_order));
        passenger_count += 1;

        if flags.has_documents {
            for document in &passenger.documents {
                segments.push(document_segment(document, config));
            }
        }
        if flags.has_seats {
            for seat in &passenger.seats {
                segments.push(
                    Segment::new("LOC")
                        .with_simple(qualifiers::LOC_SEAT)
                        .with_simple(seat.seat_number.clone()),
                );
            }
        }
        if flags.has_bags {
            for bag in &passenger.bags {
                segments.push(baggage_segment(bag));
            }
        }
    }

    // CNT - passenger count, recomputed from the groups just written
    segments.push(
        Segment::new("CNT")
            .with_composite([qualifiers::PASSENGER_COUNT.to_string(), passenger_count.to_string()]),
    );

    // UNT - segments from UNH inclusive to UNT exclusive
    let segment_count = (segments.len() - unh_index) as u64;
    segments.push(
        Segment::new("UNT")
            .with_simple(segment_count.to_string())
            .with_simple(message_reference),
    );

    // UNE/UNZ - group and interchange trailers with recomputed counts
    let message_count = segments.iter().filter(|s| s.tag == "UNH").count();
    segments.push(
        Segment::new("UNE")
            .with_simple(message_count.to_string())
            .with_simple(interchange_reference.clone()),
    );
    segments.push(
        Segment::new("UNZ")
            .with_simple(message_count.to_string())
            .with_simple(interchange_reference),
    );

    for violation in validator::validate_segments(&segments) {
        tracing::warn!("Encoded segment sequence failed validation: {}", violation);
    }

    Ok(EncodeOutcome {
        edifact: write_message(&segments, &config.delimiters),
        passenger_count,
        flight_count,
        segment_count,
    })
}

fn free_text(text: String) -> Segment {
    Segment::new("IFT").with_composite(["4", "28"]).with_simple(text)
}

fn name_segment(
    index: usize,
    passenger: &crate::domain::model::Passenger,
    order: NameOrder,
) -> Segment {
    let surname = passenger.last_name.to_uppercase();
    let given = passenger.first_name.to_uppercase();

    let mut components = vec![index.to_string()];
    match order {
        NameOrder::SurnameFirst => {
            components.push(surname);
            if !given.is_empty() {
                components.push(given);
            }
        }
        NameOrder::GivenFirst => {
            if !given.is_empty() {
                components.push(given);
            }
            components.push(surname);
        }
    }

    Segment::new("NAD")
        .with_simple(qualifiers::PASSENGER_GROUP)
        .with_composite(components)
}

fn document_segment(
    document: &crate::domain::model::TravelDocument,
    config: &CodecConfig,
) -> Segment {
    use crate::config::DocLayout;

    let issuing = document.issuing_country.clone().unwrap_or_default();
    let mut components = match config.doc_layout {
        DocLayout::NumberNationalityIssuing => {
            vec![document.document_number.clone(), document.nationality.clone(), issuing]
        }
        DocLayout::NumberIssuingNationality => {
            vec![document.document_number.clone(), issuing, document.nationality.clone()]
        }
    };
    trim_trailing_empty(&mut components);

    Segment::new("DOC")
        .with_simple(document.document_type.clone())
        .with_composite(components)
}

fn baggage_segment(bag: &crate::domain::model::Baggage) -> Segment {
    let mut components = vec![
        bag.bag_tag_number.clone(),
        bag.number_of_pieces.map(|p| p.to_string()).unwrap_or_default(),
        bag.weight.map(|w| format!("{}", w)).unwrap_or_default(),
    ];
    trim_trailing_empty(&mut components);

    Segment::new("LOC")
        .with_simple(qualifiers::LOC_BAGGAGE)
        .with_composite(components)
}

fn payment_segment(payment: &crate::domain::model::Payment, include_card: bool) -> Segment {
    let mut components = vec![payment.payment_type.clone()];
    if include_card {
        components.push(payment.card_type.clone().unwrap_or_default());
        components.push(
            payment
                .card_number
                .as_deref()
                .map(mask_card_number)
                .unwrap_or_default(),
        );
    }
    trim_trailing_empty(&mut components);
    let mut segment = Segment::new("FOP").with_composite(components);

    if let Some(amount) = payment.amount {
        let mut detail = vec![
            format!("{:.2}", amount),
            payment.currency.clone().unwrap_or_default(),
        ];
        trim_trailing_empty(&mut detail);
        segment = segment.with_composite(detail);
    }
    segment
}

fn flight_segment(flight: &Flight, codeshare: bool) -> Result<Segment> {
    let carrier: Vec<String> = if codeshare && flight.is_codeshare() {
        vec![
            flight.airline_code.clone(),
            flight.operating_code().to_string(),
        ]
    } else {
        vec![flight.airline_code.clone()]
    };

    Ok(Segment::new("TVL")
        .with_composite([
            short_date(flight.departure_date.date(), "departure_date")?,
            time_of(flight.departure_date),
            short_date(flight.arrival_date.date(), "arrival_date")?,
            time_of(flight.arrival_date),
        ])
        .with_simple(flight.departure_airport.clone())
        .with_simple(flight.arrival_airport.clone())
        .with_composite(carrier)
        .with_composite([flight.flight_number.clone(), flight.service_class.clone()]))
}

fn header_flight_info(flight: Option<&Flight>) -> Result<String> {
    match flight {
        Some(flight) => Ok(format!(
            "{}{}/{}/{}",
            flight.airline_code,
            flight.flight_number,
            full_date(flight.departure_date.date(), "departure_date")?,
            time_of(flight.departure_date),
        )),
        None => Ok("XXXX/00000000/0000".to_string()),
    }
}

fn mask_card_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    if chars.len() <= 4 {
        return number.to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "X".repeat(chars.len() - 4), tail)
}

fn non_empty_field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn trim_trailing_empty(components: &mut Vec<String>) {
    while components.last().is_some_and(|c| c.is_empty()) {
        components.pop();
    }
}

/// Fixed-width date/time formatting. A year outside the four-digit range
/// cannot be represented and fails the whole encode.
fn check_year(date: NaiveDate, field: &str) -> Result<()> {
    let year = date.year();
    if !(1000..=9999).contains(&year) {
        return Err(CodecError::UnrepresentableValue {
            field: field.to_string(),
            value: date.to_string(),
            reason: "year outside the fixed-width range 1000-9999".to_string(),
        });
    }
    Ok(())
}

fn short_date(date: NaiveDate, field: &str) -> Result<String> {
    check_year(date, field)?;
    Ok(date.format("%y%m%d").to_string())
}

fn full_date(date: NaiveDate, field: &str) -> Result<String> {
    check_year(date, field)?;
    Ok(date.format("%Y%m%d").to_string())
}

fn time_of(datetime: NaiveDateTime) -> String {
    format!("{:02}{:02}", datetime.hour(), datetime.minute())
}

fn compact_timestamp(datetime: NaiveDateTime, field: &str) -> Result<String> {
    check_year(datetime.date(), field)?;
    Ok(datetime.format("%y%m%d%H%M%S").to_string())
}
