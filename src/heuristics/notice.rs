use super::NoticeScan;
use regex::Regex;

/// Lines scanned below the municipality header before giving up.
const CITY_STATE_WINDOW: usize = 7;

/// A `PLACA` label; the plate starts right after the line break.
const PLATE_MARKER_PATTERN: &str = r"(?i)\bPLACA\b[^\n]*\n\s*";

/// Plate matchers applied to the text following a marker, in order.
///
/// The generic 7-character fallback also accepts tokens that are not
/// plates. It is kept because notices with unusual plate rendering
/// rely on it.
const PLATE_PATTERNS: &[(&str, &str)] = &[
    ("mercosul", r"(?i)^([A-Z]{3}[0-9][A-Z][0-9]{2})\b"),
    ("legacy", r"(?i)^([A-Z]{3}\s*-?\s*[0-9]{4})\b"),
    ("generic", r"(?i)^([A-Z0-9]{7})\b"),
];

/// `<city> <UF>` matchers applied to an uppercased candidate line.
const CITY_STATE_PATTERNS: &[(&str, &str)] = &[
    ("exact", r"^(.+?) ([A-Z]{2})$"),
    ("trailing-punctuation", r"^(.+?)\s+([A-Z]{2})[\s.,;:\-]*$"),
];

const DATE_TIME_PATTERN: &str = r"(?is)\bDATA\b[^\n]*?HORA.*?\b(\d{2}/\d{2}/\d{4})\s+(\d{2}:\d{2})\b";

const CODE_BLOCK_PATTERN: &str = r"(?i)C[ÓO]DIGO\s+DA\s+INFRA[CÇ][AÃ]O(?:\s*/\s*|\s+)DESDOBRAMENTO(?:\s*/\s*|\s+)VALOR\s+DA\s+MULTA\s*\n\s*(\d{4})\s+(\d)\s+(R\$\s*[0-9.,]+)";

const CITY_HEADER_PATTERN: &str = r"(?i)NOME\s+DO\s+MUNIC[IÍ]PIO\s+UF";

/// Runs until a line made only of capitals and spaces (the next section
/// header) or the end of the text.
const DESCRIPTION_PATTERN: &str = r"(?ism)DESCRI[CÇ][AÃ]O\s+DA\s+INFRA[CÇ][AÃ]O[ \t]*\n\s*(.+?)(?:\n[ \t]*(?-i:[A-ZÇÃÕÂÊÔÁÉÍÓÚÀ][A-ZÇÃÕÂÊÔÁÉÍÓÚÀ ]{4,})$|\z)";

/// Run every field matcher over the notice text.
pub(super) fn scan(text: &str) -> NoticeScan {
    let (citation_date, citation_time) = match extract_date_time(text) {
        Some((date, time)) => (Some(date), Some(time)),
        None => (None, None),
    };
    let (infraction_code_4d, subcode_1d, raw_value_token) = match extract_code_block(text) {
        Some((code, subcode, value)) => (Some(code), Some(subcode), Some(value)),
        None => (None, None, None),
    };
    let (city, state) = extract_city_state(text);

    NoticeScan {
        plate: extract_plate(text),
        citation_date,
        citation_time,
        infraction_code_4d,
        subcode_1d,
        raw_value_token,
        city,
        state,
        free_text_description: extract_description(text).unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

/// The first `PLACA` label followed by a recognizable plate wins; later
/// labels (trailer, previous owner) are only consulted when it has none.
fn extract_plate(text: &str) -> Option<String> {
    let marker = Regex::new(PLATE_MARKER_PATTERN).ok()?;
    let matchers: Vec<(&str, Regex)> = PLATE_PATTERNS
        .iter()
        .filter_map(|(name, pattern)| Regex::new(pattern).ok().map(|re| (*name, re)))
        .collect();

    marker.find_iter(text).find_map(|m| {
        let following = &text[m.end()..];
        matchers.iter().find_map(|(name, re)| {
            let cap = re.captures(following)?;
            tracing::debug!(matcher = name, "Plate matched");
            Some(
                cap[1]
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '-')
                    .collect::<String>()
                    .to_uppercase(),
            )
        })
    })
}

fn extract_date_time(text: &str) -> Option<(String, String)> {
    let re = Regex::new(DATE_TIME_PATTERN).ok()?;
    re.captures(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
}

/// The three values sit on the line right below the column header.
fn extract_code_block(text: &str) -> Option<(String, String, String)> {
    let re = Regex::new(CODE_BLOCK_PATTERN).ok()?;
    re.captures(text)
        .map(|c| (c[1].to_string(), c[2].to_string(), c[3].trim().to_string()))
}

fn extract_description(text: &str) -> Option<String> {
    let re = Regex::new(DESCRIPTION_PATTERN).ok()?;
    let cap = re.captures(text)?;
    Some(cap[1].split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Locate the municipality header and read `<city> <UF>` from one of the
/// following non-empty lines.
///
/// Returns `("", "")` when nothing matches; a missing city never fails
/// the extraction.
pub fn extract_city_state(text: &str) -> (String, String) {
    let not_found = (String::new(), String::new());

    let (Ok(header_re), Ok(space_re)) = (Regex::new(CITY_HEADER_PATTERN), Regex::new(r"\s+"))
    else {
        return not_found;
    };
    let matchers: Vec<Regex> = CITY_STATE_PATTERNS
        .iter()
        .filter_map(|(_, pattern)| Regex::new(pattern).ok())
        .collect();

    let lines: Vec<String> = text
        .lines()
        .map(|line| space_re.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let Some(header_idx) = lines.iter().position(|line| header_re.is_match(line)) else {
        return not_found;
    };

    for line in lines.iter().skip(header_idx + 1).take(CITY_STATE_WINDOW) {
        // The municipality is printed after its numeric code, e.g. "(6551) JACUPIRANGA SP"
        let candidate = match line.split_once(')') {
            Some((_, rest)) => rest.trim_start(),
            None => line.as_str(),
        }
        .to_uppercase();

        for re in &matchers {
            if let Some(cap) = re.captures(&candidate) {
                return (
                    title_case(cap[1].trim()),
                    cap[2].trim().to_uppercase(),
                );
            }
        }
    }

    not_found
}

/// Capitalize the first letter of every word and lowercase the rest.
/// Any non-letter starts a new word, so `D'OESTE` becomes `D'Oeste`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plate_formats() {
        assert_eq!(extract_plate("PLACA\nABC1D23").as_deref(), Some("ABC1D23"));
        assert_eq!(extract_plate("PLACA CHASSI\nabc-1234 9BW").as_deref(), Some("ABC1234"));
        assert_eq!(extract_plate("Placa\nABC 1234").as_deref(), Some("ABC1234"));
        assert_eq!(extract_plate("PLACA\n1AB2C34").as_deref(), Some("1AB2C34"));
        assert_eq!(extract_plate("PLACA ABC1D23"), None);
        assert_eq!(extract_plate("no marker\nABC1D23"), None);
    }

    #[test]
    fn test_plate_first_marker_wins() {
        let text = "PLACA\nABC-1234\nMARCA\nPLACA DO REBOQUE\nXYZ1A23";
        assert_eq!(extract_plate(text).as_deref(), Some("ABC1234"));

        let text = "PLACA ANTERIOR\n--\nPLACA\nXYZ1A23";
        assert_eq!(extract_plate(text).as_deref(), Some("XYZ1A23"));
    }

    #[test]
    fn test_date_time_spans_lines() {
        let text = "DATA DA INFRAÇÃO HORA\nREGISTRO\n05/01/2026\n07:45";
        assert_eq!(
            extract_date_time(text),
            Some(("05/01/2026".to_string(), "07:45".to_string()))
        );
        assert_eq!(extract_date_time("data hora 05/01/2026 07:45").unwrap().1, "07:45");
        assert_eq!(extract_date_time("05/01/2026 07:45"), None);
        assert_eq!(extract_date_time("MANDATARIO HORA\n05/01/2026 07:45"), None);
    }

    #[test]
    fn test_code_block_accent_insensitive() {
        let accented = "CÓDIGO DA INFRAÇÃO DESDOBRAMENTO VALOR DA MULTA\n7455 0 R$ 130,16";
        let plain = "CODIGO DA INFRACAO / DESDOBRAMENTO / VALOR DA MULTA\n 5010 1 R$1.467,35";
        assert_eq!(
            extract_code_block(accented),
            Some(("7455".into(), "0".into(), "R$ 130,16".into()))
        );
        assert_eq!(
            extract_code_block(plain),
            Some(("5010".into(), "1".into(), "R$1.467,35".into()))
        );
    }

    #[test]
    fn test_code_block_must_be_next_line() {
        let text = "CÓDIGO DA INFRAÇÃO DESDOBRAMENTO VALOR DA MULTA\nOBS\n7455 0 R$ 130,16";
        assert_eq!(extract_code_block(text), None);
    }

    #[test]
    fn test_city_state_with_code_prefix() {
        let text = "NOME DO MUNICIPIO UF\n\n(123) JACUPIRANGA SP\n";
        assert_eq!(
            extract_city_state(text),
            ("Jacupiranga".to_string(), "SP".to_string())
        );
    }

    #[test]
    fn test_city_state_multi_word() {
        let text = "CÓDIGO  NOME DO MUNICÍPIO   UF\n  SÃO JOSÉ DOS   CAMPOS  sp";
        assert_eq!(
            extract_city_state(text),
            ("São José Dos Campos".to_string(), "SP".to_string())
        );
    }

    #[test]
    fn test_city_state_outside_window() {
        let mut text = String::from("NOME DO MUNICIPIO UF\n");
        for i in 0..7 {
            text.push_str(&format!("LINHA{i}\n"));
        }
        text.push_str("(123) JACUPIRANGA SP\n");
        assert_eq!(extract_city_state(&text), (String::new(), String::new()));
    }

    #[test]
    fn test_city_state_last_line_of_window() {
        let mut text = String::from("NOME DO MUNICIPIO UF\n");
        for i in 0..6 {
            text.push_str(&format!("LINHA{i}\n"));
        }
        text.push_str("(123) JACUPIRANGA SP\n");
        assert_eq!(extract_city_state(&text).1, "SP");
    }

    #[test]
    fn test_city_state_without_header() {
        assert_eq!(
            extract_city_state("(123) JACUPIRANGA SP"),
            (String::new(), String::new())
        );
    }

    #[test]
    fn test_description_collapses_whitespace() {
        let text = "DESCRICAO DA INFRACAO\n  avancar   o sinal\tvermelho\n do semaforo";
        assert_eq!(
            extract_description(text).as_deref(),
            Some("avancar o sinal vermelho do semaforo")
        );
    }

    #[test]
    fn test_description_keeps_continuation_lines() {
        let text = "DESCRICAO DA INFRACAO\n\
TRANSITAR EM VELOCIDADE SUPERIOR A MAXIMA PERMITIDA\n\
EM ATE 20%\n\
ENQUADRAMENTO\n\
ART. 218 I";
        assert_eq!(
            extract_description(text).as_deref(),
            Some("TRANSITAR EM VELOCIDADE SUPERIOR A MAXIMA PERMITIDA EM ATE 20%")
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("JACUPIRANGA"), "Jacupiranga");
        assert_eq!(title_case("SANTA BÁRBARA D'OESTE"), "Santa Bárbara D'Oeste");
    }
}
