use crate::core::decoder::DecodeStats;
use crate::core::segment::{qualifiers, KnownTag, Segment};
use crate::domain::model::Manifest;
use serde::Serialize;
use std::fmt;

/// One structural problem, anchored to the segment that caused it.
/// `segment_index` is None when the problem is an absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub segment_index: Option<usize>,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ViolationKind {
    CountMismatch {
        counter: CountKind,
        declared: u64,
        observed: u64,
    },
    DanglingSegment {
        tag: String,
    },
    MissingMandatorySegment {
        tag: String,
    },
    DuplicateMandatorySegment {
        tag: String,
        occurrences: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountKind {
    Passengers,
    Segments,
    Messages,
    GroupMessages,
}

impl fmt::Display for CountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CountKind::Passengers => "passengers",
            CountKind::Segments => "segments",
            CountKind::Messages => "messages",
            CountKind::GroupMessages => "group messages",
        };
        f.write_str(label)
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::CountMismatch {
                counter,
                declared,
                observed,
            } => write!(
                f,
                "declared {} {} but observed {}",
                declared, counter, observed
            ),
            ViolationKind::DanglingSegment { tag } => {
                write!(f, "{} segment with no owning passenger group", tag)
            }
            ViolationKind::MissingMandatorySegment { tag } => {
                write!(f, "mandatory segment {} is missing", tag)
            }
            ViolationKind::DuplicateMandatorySegment { tag, occurrences } => {
                write!(f, "mandatory segment {} appears {} times", tag, occurrences)
            }
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment_index {
            Some(index) => write!(f, "segment {}: {}", index, self.kind),
            None => write!(f, "message: {}", self.kind),
        }
    }
}

/// Checks a decoded manifest against the counters collected during the
/// pass. All problems are reported; nothing aborts.
pub fn validate_decode(manifest: &Manifest, stats: &DecodeStats) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Some(declared) = stats.declared_passenger_count {
        check_count(
            &mut violations,
            CountKind::Passengers,
            declared.segment_index,
            declared.value,
            manifest.passengers.len() as u64,
        );
    }
    if let Some(declared) = stats.declared_segment_count {
        check_count(
            &mut violations,
            CountKind::Segments,
            declared.segment_index,
            declared.value,
            stats.observed_segment_count,
        );
    }
    if let Some(declared) = stats.declared_message_count {
        check_count(
            &mut violations,
            CountKind::Messages,
            declared.segment_index,
            declared.value,
            stats.observed_message_count,
        );
    }
    if let Some(declared) = stats.declared_group_message_count {
        check_count(
            &mut violations,
            CountKind::GroupMessages,
            declared.segment_index,
            declared.value,
            stats.observed_message_count,
        );
    }

    check_exactly_once(&mut violations, "UNH", &stats.unh_indexes);
    check_exactly_once(&mut violations, "UNT", &stats.unt_indexes);
    // a bare message fragment without an interchange envelope is accepted;
    // once either envelope segment appears, both must be present exactly once
    if !stats.unb_indexes.is_empty() || !stats.unz_indexes.is_empty() {
        check_exactly_once(&mut violations, "UNB", &stats.unb_indexes);
        check_exactly_once(&mut violations, "UNZ", &stats.unz_indexes);
    }

    violations
}

/// Checks the segment sequence an encoder is about to serialize: mandatory
/// segments exactly once, every trailer count equal to what the sequence
/// actually contains.
pub fn validate_segments(segments: &[Segment]) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut unb = Vec::new();
    let mut unh = Vec::new();
    let mut unt = Vec::new();
    let mut unz = Vec::new();
    let mut declared_passengers: Option<(usize, u64)> = None;
    let mut declared_segments: Option<(usize, u64)> = None;
    let mut declared_messages: Option<(usize, u64)> = None;
    let mut observed_passengers = 0u64;
    let mut observed_segments = 0u64;
    let mut in_message = false;

    for (index, segment) in segments.iter().enumerate() {
        match segment.known_tag() {
            Some(KnownTag::Unh) => {
                unh.push(index);
                in_message = true;
                observed_segments = 1;
                continue;
            }
            Some(KnownTag::Unt) => {
                unt.push(index);
                in_message = false;
                declared_segments = parse_declared(index, segment.component(0, 0));
                continue;
            }
            _ => {}
        }
        if in_message {
            observed_segments += 1;
        }
        match segment.known_tag() {
            Some(KnownTag::Unb) => unb.push(index),
            Some(KnownTag::Unz) => {
                unz.push(index);
                declared_messages = parse_declared(index, segment.component(0, 0));
            }
            Some(KnownTag::Nad) => {
                if segment.qualifier() == Some(qualifiers::PASSENGER_GROUP) {
                    observed_passengers += 1;
                }
            }
            Some(KnownTag::Cnt) => {
                if segment.qualifier() == Some(qualifiers::PASSENGER_COUNT) {
                    declared_passengers = parse_declared(index, segment.component(0, 1));
                }
            }
            _ => {}
        }
    }

    if let Some((index, declared)) = declared_passengers {
        check_count(
            &mut violations,
            CountKind::Passengers,
            index,
            declared,
            observed_passengers,
        );
    }
    if let Some((index, declared)) = declared_segments {
        check_count(
            &mut violations,
            CountKind::Segments,
            index,
            declared,
            observed_segments,
        );
    }
    if let Some((index, declared)) = declared_messages {
        check_count(
            &mut violations,
            CountKind::Messages,
            index,
            declared,
            unh.len() as u64,
        );
    }

    check_exactly_once(&mut violations, "UNH", &unh);
    check_exactly_once(&mut violations, "UNT", &unt);
    check_exactly_once(&mut violations, "UNB", &unb);
    check_exactly_once(&mut violations, "UNZ", &unz);

    violations
}

fn parse_declared(index: usize, value: Option<&str>) -> Option<(usize, u64)> {
    value.and_then(|v| v.trim().parse().ok()).map(|n| (index, n))
}

fn check_count(
    violations: &mut Vec<Violation>,
    counter: CountKind,
    segment_index: usize,
    declared: u64,
    observed: u64,
) {
    if declared != observed {
        violations.push(Violation {
            segment_index: Some(segment_index),
            kind: ViolationKind::CountMismatch {
                counter,
                declared,
                observed,
            },
        });
    }
}

fn check_exactly_once(violations: &mut Vec<Violation>, tag: &str, indexes: &[usize]) {
    match indexes.len() {
        0 => violations.push(Violation {
            segment_index: None,
            kind: ViolationKind::MissingMandatorySegment {
                tag: tag.to_string(),
            },
        }),
        1 => {}
        occurrences => violations.push(Violation {
            segment_index: Some(indexes[1]),
            kind: ViolationKind::DuplicateMandatorySegment {
                tag: tag.to_string(),
                occurrences,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segment::Segment;

    fn envelope(body: Vec<Segment>) -> Vec<Segment> {
        let mut segments = vec![
            Segment::new("UNB")
                .with_composite(["IATA", "1"])
                .with_simple("AA")
                .with_simple("USCBP"),
            Segment::new("UNH").with_simple("1").with_composite(["PAXLST"]),
        ];
        let body_len = body.len() as u64;
        segments.extend(body);
        // UNT covers UNH inclusive to UNT exclusive
        segments.push(
            Segment::new("UNT")
                .with_simple((1 + body_len).to_string())
                .with_simple("1"),
        );
        segments.push(Segment::new("UNZ").with_simple("1").with_simple("REF"));
        segments
    }

    #[test]
    fn test_consistent_sequence_has_no_violations() {
        let segments = envelope(vec![
            Segment::new("NAD").with_simple("FL").with_composite(["1", "DOE", "JOHN"]),
            Segment::new("CNT").with_composite(["42", "1"]),
        ]);
        assert!(validate_segments(&segments).is_empty());
    }

    #[test]
    fn test_wrong_trailer_count_is_flagged() {
        let mut segments = envelope(vec![Segment::new("NAD")
            .with_simple("FL")
            .with_composite(["1", "DOE", "JOHN"])]);
        // corrupt the UNT declared count
        let unt = segments.len() - 2;
        segments[unt] = Segment::new("UNT").with_simple("9").with_simple("1");

        let violations = validate_segments(&segments);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationKind::CountMismatch {
                counter: CountKind::Segments,
                declared: 9,
                observed: 2,
            }
        ));
    }

    #[test]
    fn test_wrong_passenger_count_is_flagged() {
        let segments = envelope(vec![
            Segment::new("NAD").with_simple("FL").with_composite(["1", "DOE", "JOHN"]),
            Segment::new("CNT").with_composite(["42", "4"]),
        ]);
        let violations = validate_segments(&segments);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            violations[0].kind,
            ViolationKind::CountMismatch {
                counter: CountKind::Passengers,
                declared: 4,
                observed: 1,
            }
        ));
    }

    #[test]
    fn test_missing_interchange_trailer_is_flagged() {
        let mut segments = envelope(vec![]);
        segments.pop(); // drop UNZ
        let violations = validate_segments(&segments);
        assert!(violations.iter().any(|v| matches!(
            &v.kind,
            ViolationKind::MissingMandatorySegment { tag } if tag == "UNZ"
        )));
    }

    #[test]
    fn test_duplicate_message_header_is_flagged() {
        let mut segments = envelope(vec![]);
        segments.insert(2, Segment::new("UNH").with_simple("2"));
        let violations = validate_segments(&segments);
        assert!(violations.iter().any(|v| matches!(
            &v.kind,
            ViolationKind::DuplicateMandatorySegment { tag, occurrences: 2 } if tag == "UNH"
        )));
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation {
            segment_index: Some(3),
            kind: ViolationKind::CountMismatch {
                counter: CountKind::Segments,
                declared: 5,
                observed: 3,
            },
        };
        assert_eq!(
            violation.to_string(),
            "segment 3: declared 5 segments but observed 3"
        );

        let violation = Violation {
            segment_index: None,
            kind: ViolationKind::MissingMandatorySegment {
                tag: "UNT".to_string(),
            },
        };
        assert_eq!(violation.to_string(), "message: mandatory segment UNT is missing");
    }
}
