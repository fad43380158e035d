use crate::config::{CodecConfig, DocLayout, NameOrder};
use crate::core::segment::{qualifiers, KnownTag, Segment};
use crate::core::tokenizer::{split_segment, Delimiters, SegmentIter};
use crate::core::validator::{self, Violation, ViolationKind};
use crate::domain::model::{
    BaggageRecord, DocumentKind, DocumentRecord, LocationRecord, Manifest, ManifestPassenger,
};
use crate::utils::error::{CodecError, Result};

/// Best-effort manifest plus everything the validator flagged. Callers must
/// inspect `violations` before trusting the manifest.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub manifest: Manifest,
    pub violations: Vec<Violation>,
}

/// Declared and observed counters collected in the decode pass; consumed by
/// the validator.
#[derive(Debug, Default)]
pub struct DecodeStats {
    pub declared_passenger_count: Option<Declared>,
    pub declared_segment_count: Option<Declared>,
    pub declared_message_count: Option<Declared>,
    pub declared_group_message_count: Option<Declared>,
    /// Segments from UNH inclusive to UNT exclusive.
    pub observed_segment_count: u64,
    pub observed_message_count: u64,
    pub unb_indexes: Vec<usize>,
    pub unh_indexes: Vec<usize>,
    pub unt_indexes: Vec<usize>,
    pub unz_indexes: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct Declared {
    pub segment_index: usize,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Header,
    AwaitingPassenger,
    InPassenger,
    Trailer,
}

/// Decodes one EDIFACT message into a [`Manifest`]. A UNA service string at
/// the start of the message overrides the configured delimiters. Tokenizer
/// malformations abort; semantic issues are collected as violations and the
/// manifest is still returned.
pub fn decode(input: &str, config: &CodecConfig) -> Result<DecodeOutcome> {
    let delimiters = Delimiters::from_una(input).unwrap_or(config.delimiters);

    let mut manifest = Manifest::default();
    let mut violations = Vec::new();
    let mut stats = DecodeStats::default();
    let mut state = DecoderState::Header;
    // the only mutable look-back: the passenger group being assembled
    let mut current: Option<ManifestPassenger> = None;
    let mut in_message_span = false;

    for (index, raw) in SegmentIter::new(input, delimiters).enumerate() {
        let raw = raw?;
        let segment = split_segment(&raw, &delimiters)?;
        let known = segment.known_tag();

        match known {
            Some(KnownTag::Unh) => {
                in_message_span = true;
                stats.observed_segment_count = 1;
            }
            Some(KnownTag::Unt) => in_message_span = false,
            _ if in_message_span => stats.observed_segment_count += 1,
            _ => {}
        }

        match known {
            None => {
                manifest.unknown_segments += 1;
                tracing::debug!(
                    "Ignoring unknown segment tag {:?} at index {}",
                    segment.tag,
                    index
                );
            }
            Some(KnownTag::Unb) => {
                stats.unb_indexes.push(index);
                manifest.sender = non_empty(segment.component(1, 0));
                manifest.receiver = non_empty(segment.component(2, 0));
                manifest.interchange_reference = non_empty(segment.component(4, 0));
            }
            Some(KnownTag::Unh) => {
                stats.unh_indexes.push(index);
                stats.observed_message_count += 1;
                manifest.message_reference = non_empty(segment.component(0, 0));
                manifest.message_type = non_empty(segment.component(1, 0));
                if state == DecoderState::Header {
                    state = DecoderState::AwaitingPassenger;
                }
            }
            Some(KnownTag::Eqn) => {
                if let Some(value) = parse_count(segment.component(0, 0)) {
                    stats.declared_passenger_count = Some(Declared {
                        segment_index: index,
                        value,
                    });
                }
            }
            Some(KnownTag::Cnt) => {
                if segment.qualifier() == Some(qualifiers::PASSENGER_COUNT) {
                    if let Some(value) = parse_count(segment.component(0, 1)) {
                        stats.declared_passenger_count = Some(Declared {
                            segment_index: index,
                            value,
                        });
                    }
                }
            }
            Some(KnownTag::Nad) => {
                if segment.qualifier() == Some(qualifiers::PASSENGER_GROUP) {
                    if state == DecoderState::Trailer {
                        violations.push(dangling(index, &segment));
                    } else {
                        if let Some(done) = current.take() {
                            manifest.passengers.push(done);
                        }
                        current = Some(parse_passenger_name(&segment, index, config)?);
                        state = DecoderState::InPassenger;
                    }
                }
                // NAD for other parties (agent, carrier contact): skipped
            }
            Some(KnownTag::Doc) => match current.as_mut() {
                Some(passenger) => passenger.documents.push(parse_document(&segment, config)),
                None => violations.push(dangling(index, &segment)),
            },
            Some(KnownTag::Loc) => match current.as_mut() {
                Some(passenger) => apply_location(passenger, &segment),
                None => violations.push(dangling(index, &segment)),
            },
            Some(KnownTag::Unt) => {
                stats.unt_indexes.push(index);
                if let Some(done) = current.take() {
                    manifest.passengers.push(done);
                }
                if let Some(value) = parse_count(segment.component(0, 0)) {
                    stats.declared_segment_count = Some(Declared {
                        segment_index: index,
                        value,
                    });
                }
                state = DecoderState::Trailer;
            }
            Some(KnownTag::Une) => {
                if let Some(value) = parse_count(segment.component(0, 0)) {
                    stats.declared_group_message_count = Some(Declared {
                        segment_index: index,
                        value,
                    });
                }
            }
            Some(KnownTag::Unz) => {
                stats.unz_indexes.push(index);
                if let Some(value) = parse_count(segment.component(0, 0)) {
                    stats.declared_message_count = Some(Declared {
                        segment_index: index,
                        value,
                    });
                }
            }
            Some(_) => {
                // recognised body segment (TVL, SSR, RCI, ...): no manifest
                // content at this level
            }
        }
    }

    // message without a trailer: the last passenger still counts
    if let Some(done) = current.take() {
        manifest.passengers.push(done);
    }
    manifest.declared_passenger_count = stats.declared_passenger_count.map(|d| d.value);
    manifest.declared_segment_count = stats.declared_segment_count.map(|d| d.value);

    violations.extend(validator::validate_decode(&manifest, &stats));
    tracing::debug!(
        "Decoded {} passengers, {} violations, {} unknown segments",
        manifest.passengers.len(),
        violations.len(),
        manifest.unknown_segments
    );
    Ok(DecodeOutcome {
        manifest,
        violations,
    })
}

fn dangling(index: usize, segment: &Segment) -> Violation {
    Violation {
        segment_index: Some(index),
        kind: ViolationKind::DanglingSegment {
            tag: segment.tag.clone(),
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn parse_count(value: Option<&str>) -> Option<u64> {
    let raw = value?.trim();
    match raw.parse() {
        Ok(count) => Some(count),
        Err(_) => {
            tracing::debug!("Unparseable count value {:?}", raw);
            None
        }
    }
}

/// Decodes the NAD name composite. A leading all-numeric component is the
/// party reference; the remaining components are surname/given per the
/// configured order. Zero name components reject the segment.
fn parse_passenger_name(
    segment: &Segment,
    index: usize,
    config: &CodecConfig,
) -> Result<ManifestPassenger> {
    let mut parts: Vec<&str> = segment
        .element(1)
        .map(|e| {
            e.components
                .iter()
                .map(String::as_str)
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mut party_reference = None;
    if parts.len() >= 2 && parts[0].chars().all(|c| c.is_ascii_digit()) {
        party_reference = Some(parts.remove(0).to_string());
    }

    if parts.is_empty() {
        return Err(CodecError::InvalidPassengerName {
            segment_index: index,
            reason: "name composite has no components".to_string(),
        });
    }

    let (surname, given_name) = match config.name_order {
        NameOrder::SurnameFirst => (parts[0].to_string(), parts[1..].join(" ")),
        NameOrder::GivenFirst => {
            let last = parts.len() - 1;
            (parts[last].to_string(), parts[..last].join(" "))
        }
    };

    Ok(ManifestPassenger {
        surname,
        given_name,
        party_reference,
        ..Default::default()
    })
}

/// Extracts document fields positionally from the DOC detail composite. An
/// unrecognised type code is retained verbatim.
fn parse_document(segment: &Segment, config: &CodecConfig) -> DocumentRecord {
    let type_code = segment.qualifier().unwrap_or("").to_string();
    let detail = segment.element(1);
    let component = |index: usize| {
        detail
            .and_then(|e| e.component(index))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let (nationality_index, issuing_index) = match config.doc_layout {
        DocLayout::NumberNationalityIssuing => (1, 2),
        DocLayout::NumberIssuingNationality => (2, 1),
    };

    DocumentRecord {
        kind: DocumentKind::from_code(&type_code),
        type_code,
        number: component(0).unwrap_or_default(),
        nationality: component(nationality_index),
        issuing_country: component(issuing_index),
    }
}

/// LOC is ambiguous on the wire: the qualifier decides between seat,
/// departure/arrival point and baggage. An unrecognised qualifier attaches
/// the raw value as an unclassified location, never a seat.
fn apply_location(passenger: &mut ManifestPassenger, segment: &Segment) {
    let qualifier = segment.qualifier().unwrap_or("");
    let value = segment.component(1, 0).unwrap_or("").to_string();
    match qualifier {
        qualifiers::LOC_SEAT => passenger.seat = Some(value),
        qualifiers::LOC_DEPARTURE => passenger.embarkation = Some(value),
        qualifiers::LOC_ARRIVAL => passenger.disembarkation = Some(value),
        qualifiers::LOC_BAGGAGE => passenger.bags.push(BaggageRecord {
            tag: value,
            pieces: segment.component(1, 1).and_then(|v| v.parse().ok()),
            weight: segment.component(1, 2).and_then(|v| v.parse().ok()),
        }),
        other => passenger.other_locations.push(LocationRecord {
            qualifier: other.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::CountKind;

    fn decode_default(input: &str) -> DecodeOutcome {
        decode(input, &CodecConfig::default()).unwrap()
    }

    #[test]
    fn test_decodes_single_passenger_message() {
        let outcome = decode_default(
            "UNH+1+PAXLST:D:05B:UN:IATA'NAD+FL+1:Doe:John'DOC+P+A1234567:DEU'UNT+3+1'",
        );

        assert_eq!(outcome.manifest.passengers.len(), 1);
        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.full_name(), "Doe John");
        assert_eq!(passenger.party_reference.as_deref(), Some("1"));
        assert_eq!(passenger.documents.len(), 1);
        let document = &passenger.documents[0];
        assert_eq!(document.kind, DocumentKind::Passport);
        assert_eq!(document.number, "A1234567");
        assert_eq!(document.nationality.as_deref(), Some("DEU"));
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_declared_count_mismatch_is_single_violation() {
        let outcome = decode_default(
            "UNH+1+PAXLST:D:05B:UN:IATA'NAD+FL+1:Doe:John'DOC+P+A1234567:DEU'UNT+5+1'",
        );

        assert_eq!(outcome.manifest.passengers.len(), 1);
        assert_eq!(outcome.violations.len(), 1);
        match &outcome.violations[0].kind {
            ViolationKind::CountMismatch {
                counter,
                declared,
                observed,
            } => {
                assert_eq!(*counter, CountKind::Segments);
                assert_eq!(*declared, 5);
                assert_eq!(*observed, 3);
            }
            other => panic!("expected CountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_doc_before_any_passenger_is_dangling() {
        let outcome =
            decode_default("UNH+1+PAXLST'DOC+P+A1234567:DEU'NAD+FL+1:Doe:John'UNT+3+1'");

        assert_eq!(outcome.manifest.passengers.len(), 1);
        assert!(outcome.manifest.passengers[0].documents.is_empty());
        assert!(outcome.violations.iter().any(|v| matches!(
            &v.kind,
            ViolationKind::DanglingSegment { tag } if tag == "DOC"
        )));
        let dangling = outcome
            .violations
            .iter()
            .find(|v| matches!(&v.kind, ViolationKind::DanglingSegment { .. }))
            .unwrap();
        assert_eq!(dangling.segment_index, Some(1));
    }

    #[test]
    fn test_loc_qualifier_dispatch() {
        let outcome = decode_default(
            "UNH+1+PAXLST'NAD+FL+1:Doe:John'LOC+148+14C'LOC+125+JFK'LOC+87+LHR'LOC+999+ZZZ'UNT+6+1'",
        );

        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.seat.as_deref(), Some("14C"));
        assert_eq!(passenger.embarkation.as_deref(), Some("JFK"));
        assert_eq!(passenger.disembarkation.as_deref(), Some("LHR"));
        assert_eq!(passenger.other_locations.len(), 1);
        assert_eq!(passenger.other_locations[0].qualifier, "999");
        assert_eq!(passenger.other_locations[0].value, "ZZZ");
    }

    #[test]
    fn test_unrecognised_loc_qualifier_never_sets_seat() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John'LOC+777+22A'UNT+3+1'");

        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.seat, None);
        assert_eq!(passenger.other_locations.len(), 1);
    }

    #[test]
    fn test_baggage_location_parses_pieces_and_weight() {
        let outcome =
            decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John'LOC+91+0047112233:2:23.5'UNT+3+1'");

        let bags = &outcome.manifest.passengers[0].bags;
        assert_eq!(bags.len(), 1);
        assert_eq!(bags[0].tag, "0047112233");
        assert_eq!(bags[0].pieces, Some(2));
        assert_eq!(bags[0].weight, Some(23.5));
    }

    #[test]
    fn test_second_nad_finalizes_prior_passenger() {
        let outcome = decode_default(
            "UNH+1+PAXLST'NAD+FL+1:Doe:John'DOC+P+A1:DEU'NAD+FL+2:Roe:Jane'DOC+P+B2:FRA'UNT+5+1'",
        );

        assert_eq!(outcome.manifest.passengers.len(), 2);
        assert_eq!(outcome.manifest.passengers[0].surname, "Doe");
        assert_eq!(outcome.manifest.passengers[0].documents[0].number, "A1");
        assert_eq!(outcome.manifest.passengers[1].surname, "Roe");
        assert_eq!(outcome.manifest.passengers[1].documents[0].number, "B2");
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_empty_name_composite_is_fatal() {
        let result = decode("UNH+1+PAXLST'NAD+FL'UNT+2+1'", &CodecConfig::default());
        match result {
            Err(CodecError::InvalidPassengerName { segment_index, .. }) => {
                assert_eq!(segment_index, 1)
            }
            other => panic!("expected InvalidPassengerName, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_all_empty_name_components_are_fatal() {
        let result = decode("UNH+1+PAXLST'NAD+FL+::'UNT+2+1'", &CodecConfig::default());
        assert!(matches!(
            result,
            Err(CodecError::InvalidPassengerName { .. })
        ));
    }

    #[test]
    fn test_given_first_name_order() {
        let config = CodecConfig {
            name_order: NameOrder::GivenFirst,
            ..Default::default()
        };
        let outcome = decode("UNH+1+PAXLST'NAD+FL+1:John:Doe'UNT+2+1'", &config).unwrap();
        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.surname, "Doe");
        assert_eq!(passenger.given_name, "John");
    }

    #[test]
    fn test_name_without_party_reference() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+Doe:John'UNT+2+1'");
        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.party_reference, None);
        assert_eq!(passenger.surname, "Doe");
        assert_eq!(passenger.given_name, "John");
    }

    #[test]
    fn test_single_component_name_is_surname_only() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+MADONNA'UNT+2+1'");
        let passenger = &outcome.manifest.passengers[0];
        assert_eq!(passenger.surname, "MADONNA");
        assert_eq!(passenger.given_name, "");
    }

    #[test]
    fn test_unknown_document_type_retained_verbatim() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John'DOC+ZZ+N42:GBR'UNT+3+1'");
        let document = &outcome.manifest.passengers[0].documents[0];
        assert_eq!(document.type_code, "ZZ");
        assert_eq!(document.kind, DocumentKind::Other);
        assert_eq!(document.number, "N42");
    }

    #[test]
    fn test_issuing_before_nationality_layout() {
        let config = CodecConfig {
            doc_layout: DocLayout::NumberIssuingNationality,
            ..Default::default()
        };
        let outcome =
            decode("UNH+1+PAXLST'NAD+FL+1:Doe:John'DOC+P+A1:USA:DEU'UNT+3+1'", &config).unwrap();
        let document = &outcome.manifest.passengers[0].documents[0];
        assert_eq!(document.issuing_country.as_deref(), Some("USA"));
        assert_eq!(document.nationality.as_deref(), Some("DEU"));
    }

    #[test]
    fn test_unknown_segments_counted_not_errored() {
        let outcome = decode_default("UNH+1+PAXLST'XYZ+1'NAD+FL+1:Doe:John'QQQ+2'UNT+4+1'");
        assert_eq!(outcome.manifest.unknown_segments, 2);
        assert_eq!(outcome.manifest.passengers.len(), 1);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_recognised_body_segments_skipped_silently() {
        let outcome = decode_default(
            "UNH+1+PAXLST'RCI+AA:ABC123'TVL+240301:0830+JFK+LHR+AA+0100:Y'NAD+FL+1:Doe:John'UNT+4+1'",
        );
        assert_eq!(outcome.manifest.unknown_segments, 0);
        assert_eq!(outcome.manifest.passengers.len(), 1);
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_header_metadata_from_unb_and_unh() {
        let outcome = decode_default(
            "UNB+IATA:1+AA+USCBP+240301:1015+240301101500AB+PAXLST'UNH+MSG001+PAXLST:D:05B:UN:IATA'NAD+FL+1:Doe:John'UNT+2+MSG001'UNZ+1+240301101500AB'",
        );
        assert_eq!(outcome.manifest.sender.as_deref(), Some("AA"));
        assert_eq!(outcome.manifest.receiver.as_deref(), Some("USCBP"));
        assert_eq!(
            outcome.manifest.interchange_reference.as_deref(),
            Some("240301101500AB")
        );
        assert_eq!(outcome.manifest.message_reference.as_deref(), Some("MSG001"));
        assert_eq!(outcome.manifest.message_type.as_deref(), Some("PAXLST"));
        assert!(outcome.violations.is_empty());
    }

    #[test]
    fn test_cnt_passenger_count_checked() {
        let outcome =
            decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John'CNT+42:3'UNT+3+1'");
        assert_eq!(outcome.violations.len(), 1);
        assert!(matches!(
            outcome.violations[0].kind,
            ViolationKind::CountMismatch {
                counter: CountKind::Passengers,
                declared: 3,
                observed: 1,
            }
        ));
    }

    #[test]
    fn test_eqn_header_count_checked() {
        let outcome = decode_default("UNH+1+PAXLST'EQN+2'NAD+FL+1:Doe:John'UNT+3+1'");
        assert!(outcome.violations.iter().any(|v| matches!(
            v.kind,
            ViolationKind::CountMismatch {
                counter: CountKind::Passengers,
                declared: 2,
                observed: 1,
            }
        )));
    }

    #[test]
    fn test_passenger_finalized_without_trailer() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John");
        assert_eq!(outcome.manifest.passengers.len(), 1);
    }

    #[test]
    fn test_child_segment_after_trailer_is_dangling() {
        let outcome =
            decode_default("UNH+1+PAXLST'NAD+FL+1:Doe:John'UNT+2+1'DOC+P+A1:DEU'");
        assert_eq!(outcome.manifest.passengers.len(), 1);
        assert!(outcome.manifest.passengers[0].documents.is_empty());
        assert!(outcome.violations.iter().any(|v| matches!(
            &v.kind,
            ViolationKind::DanglingSegment { tag } if tag == "DOC"
        )));
    }

    #[test]
    fn test_escaped_name_round_trips_through_decode() {
        let outcome = decode_default("UNH+1+PAXLST'NAD+FL+1:O?'HARA:MILES'UNT+2+1'");
        assert_eq!(outcome.manifest.passengers[0].surname, "O'HARA");
    }

    #[test]
    fn test_malformed_escape_aborts_decode() {
        let result = decode("UNH+1+PAXLST'NAD+FL+1:DOE?", &CodecConfig::default());
        assert!(matches!(result, Err(CodecError::MalformedEscape { .. })));
    }
}
