//! Sample upstream payloads.
//!
//! Bodies are trimmed copies of real aviationweather.gov responses. The
//! proxy never parses them; tests only compare them byte for byte.

/// METAR payloads in each format the upstream serves.
pub mod metar {
    /// `format=json`
    pub const JSON_BODY: &str = r#"[{"icaoId":"KJFK","receiptTime":"2024-01-15 12:54:05","obsTime":1705323060,"temp":2.8,"dewp":-5.6,"wdir":310,"wspd":14,"visib":"10+","altim":1021.2,"rawOb":"KJFK 151251Z 31014KT 10SM FEW250 03/M06 A3016","name":"New York/JF Kennedy Intl, NY, US"},{"icaoId":"KLAX","receiptTime":"2024-01-15 12:54:04","obsTime":1705323180,"temp":12.2,"dewp":8.9,"wdir":0,"wspd":0,"visib":"10+","altim":1017.6,"rawOb":"KLAX 151253Z 00000KT 10SM CLR 12/09 A3005","name":"Los Angeles Intl, CA, US"}]"#;

    /// `format=xml`
    pub const XML_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><response><data num_results="1"><METAR><raw_text>KJFK 151251Z 31014KT 10SM FEW250 03/M06 A3016</raw_text><station_id>KJFK</station_id><temp_c>2.8</temp_c></METAR></data></response>"#;

    /// `format=csv`
    pub const CSV_BODY: &str = "icaoId,obsTime,temp,dewp,rawOb\nKJFK,1705323060,2.8,-5.6,KJFK 151251Z 31014KT 10SM FEW250 03/M06 A3016\n";

    /// `format=raw`
    pub const RAW_BODY: &str = "KJFK 151251Z 31014KT 10SM FEW250 03/M06 A3016\nKLAX 151253Z 00000KT 10SM CLR 12/09 A3005\n";
}

/// Station scopes used across tests.
pub mod scope {
    /// Two major airports.
    pub const IDS: &str = "KJFK,KLAX";

    /// Roughly the Great Lakes.
    pub const BBOX: &str = "40,-90,45,-85";
}
