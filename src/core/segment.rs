/// One delimited record within a message: a tag plus ordered elements,
/// each element an ordered list of component strings. Component values are
/// stored unescaped; the tokenizer applies the release character on the way
/// in and out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tag: String,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub components: Vec<String>,
}

impl Element {
    pub fn new(components: Vec<String>) -> Self {
        Self { components }
    }

    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            components: vec![value.into()],
        }
    }

    pub fn component(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    pub fn first(&self) -> &str {
        self.component(0).unwrap_or("")
    }
}

impl Segment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_simple(mut self, value: impl Into<String>) -> Self {
        self.elements.push(Element::simple(value));
        self
    }

    pub fn with_composite<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements
            .push(Element::new(components.into_iter().map(Into::into).collect()));
        self
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    /// Component `component` of element `element`, or None when absent.
    pub fn component(&self, element: usize, component: usize) -> Option<&str> {
        self.elements.get(element).and_then(|e| e.component(component))
    }

    /// First component of the first element; the qualifier slot for
    /// NAD/LOC/CNT-style segments.
    pub fn qualifier(&self) -> Option<&str> {
        self.component(0, 0)
    }

    pub fn known_tag(&self) -> Option<KnownTag> {
        KnownTag::parse(&self.tag)
    }
}

/// Segment-tag vocabulary shared by decoder and encoder. Tags outside this
/// list are preserved opaquely and never semantically interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownTag {
    /// Service string advice
    Una,
    /// Interchange header
    Unb,
    /// Functional group header
    Ung,
    /// Message header
    Unh,
    /// Name and address; qualifier FL starts a passenger group
    Nad,
    /// Travel document
    Doc,
    /// Location; meaning depends on the qualifier code
    Loc,
    /// Control count
    Cnt,
    /// Number of units (header passenger count in legacy feeds)
    Eqn,
    /// Message trailer
    Unt,
    /// Functional group trailer
    Une,
    /// Interchange trailer
    Unz,
    // Body segments emitted by upstream reservation systems; recognised so
    // they are skipped rather than counted as unknown.
    Msg,
    Org,
    Tvl,
    Tra,
    Rpi,
    Apd,
    Ssr,
    Src,
    Rci,
    Dat,
    Ift,
    Fop,
}

impl KnownTag {
    pub fn parse(tag: &str) -> Option<Self> {
        let known = match tag {
            "UNA" => KnownTag::Una,
            "UNB" => KnownTag::Unb,
            "UNG" => KnownTag::Ung,
            "UNH" => KnownTag::Unh,
            "NAD" => KnownTag::Nad,
            "DOC" => KnownTag::Doc,
            "LOC" => KnownTag::Loc,
            "CNT" => KnownTag::Cnt,
            "EQN" => KnownTag::Eqn,
            "UNT" => KnownTag::Unt,
            "UNE" => KnownTag::Une,
            "UNZ" => KnownTag::Unz,
            "MSG" => KnownTag::Msg,
            "ORG" => KnownTag::Org,
            "TVL" => KnownTag::Tvl,
            "TRA" => KnownTag::Tra,
            "RPI" => KnownTag::Rpi,
            "APD" => KnownTag::Apd,
            "SSR" => KnownTag::Ssr,
            "SRC" => KnownTag::Src,
            "RCI" => KnownTag::Rci,
            "DAT" => KnownTag::Dat,
            "IFT" => KnownTag::Ift,
            "FOP" => KnownTag::Fop,
            _ => return None,
        };
        Some(known)
    }
}

/// Qualifier codes used for dispatch. Receiver-specific conventions live
/// here rather than scattered through decoder/encoder.
pub mod qualifiers {
    /// NAD party qualifier that opens a passenger group.
    pub const PASSENGER_GROUP: &str = "FL";
    /// CNT count qualifier for the total number of passengers.
    pub const PASSENGER_COUNT: &str = "42";
    /// LOC: port of departure/embarkation.
    pub const LOC_DEPARTURE: &str = "125";
    /// LOC: port of arrival/disembarkation.
    pub const LOC_ARRIVAL: &str = "87";
    /// LOC: seat assignment.
    pub const LOC_SEAT: &str = "148";
    /// LOC: baggage location/tag.
    pub const LOC_BAGGAGE: &str = "91";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_expected_shape() {
        let segment = Segment::new("NAD")
            .with_simple("FL")
            .with_composite(["1", "DOE", "JOHN"]);

        assert_eq!(segment.tag, "NAD");
        assert_eq!(segment.qualifier(), Some("FL"));
        assert_eq!(segment.component(1, 1), Some("DOE"));
        assert_eq!(segment.component(1, 3), None);
        assert_eq!(segment.component(2, 0), None);
    }

    #[test]
    fn test_known_tag_parse() {
        assert_eq!(KnownTag::parse("NAD"), Some(KnownTag::Nad));
        assert_eq!(KnownTag::parse("UNT"), Some(KnownTag::Unt));
        assert_eq!(KnownTag::parse("XYZ"), None);
        assert_eq!(KnownTag::parse(""), None);
    }

    #[test]
    fn test_element_first_is_empty_for_no_components() {
        let element = Element::new(vec![]);
        assert_eq!(element.first(), "");
    }
}
