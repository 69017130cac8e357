use super::OutputFormatter;
use crate::lookup::LookupOutcome;
use crate::whois::WhoisRecord;

pub struct JsonFormatter {
    pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    fn to_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_record(&self, record: &WhoisRecord) -> String {
        self.to_json(record)
    }

    fn format_outcome(&self, outcome: &LookupOutcome) -> String {
        self.to_json(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whois::parse_generic;

    #[test]
    fn test_compact_outcome() {
        let outcome = LookupOutcome::failure("timed out", 2.0);
        let json = JsonFormatter::new().compact().format_outcome(&outcome);
        assert_eq!(json, r#"{"status":false,"time":2.0,"error":"timed out"}"#);
    }

    #[test]
    fn test_record_uses_wire_names() {
        let record = parse_generic("Registrar URL: http://www.example-registrar.com");
        let json = JsonFormatter::new().format_record(&record);
        assert!(json.contains(r#""registrarURL": "http://www.example-registrar.com""#));
        assert!(json.contains(r#""originAS": "Unknown""#));
    }
}
