//! Pulls structured parameters out of free-form messages.

use ethers_core::types::U256;
use lazy_static::lazy_static;
use regex::Regex;

use super::ActionRequest;
use crate::blockchain::networks::NEAR_TOKEN_DECIMALS;
use crate::blockchain::services::deploy::TokenSpec;
use crate::error::{ActionError, ActionResult};
use crate::utils::{is_address, is_tx_hash, parse_units, MAX_DECIMALS};

lazy_static! {
    // The hex run must end at a boundary so an address is never cut from a
    // longer hash; the `0x` prefix may follow any character.
    static ref ADDRESS_IN_TEXT: Regex = Regex::new(r"0x[a-fA-F0-9]{40}\b").expect("static regex");
    static ref TX_HASH_IN_TEXT: Regex = Regex::new(r"0x[a-fA-F0-9]{64}\b").expect("static regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Address,
    TxHash,
}

impl FieldKind {
    fn find_in(&self, text: &str) -> Option<String> {
        let re: &Regex = match self {
            FieldKind::Address => &*ADDRESS_IN_TEXT,
            FieldKind::TxHash => &*TX_HASH_IN_TEXT,
        };
        re.find(text).map(|m| m.as_str().to_string())
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            FieldKind::Address => is_address(value),
            FieldKind::TxHash => is_tx_hash(value),
        }
    }

    fn hint(&self) -> &'static str {
        match self {
            FieldKind::Address => "Please provide a valid 0x address",
            FieldKind::TxHash => "Please provide a valid transaction hash",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Option keys accepted besides `name`, e.g. `txHash` for `tx_hash`.
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSchema {
    pub fields: &'static [FieldSpec],
}

pub const ADDRESS_SCHEMA: ParamSchema = ParamSchema {
    fields: &[FieldSpec {
        name: "address",
        kind: FieldKind::Address,
        required: true,
        aliases: &[],
    }],
};

pub const TX_HASH_SCHEMA: ParamSchema = ParamSchema {
    fields: &[FieldSpec {
        name: "tx_hash",
        kind: FieldKind::TxHash,
        required: true,
        aliases: &["txHash", "hash"],
    }],
};

pub const RECIPIENT_SCHEMA: ParamSchema = ParamSchema {
    fields: &[FieldSpec {
        name: "to_address",
        kind: FieldKind::Address,
        required: true,
        aliases: &["toAddress", "recipient", "address"],
    }],
};

/// Values found for a schema, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedParams {
    values: Vec<(&'static str, String)>,
}

impl ExtractedParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn require(&self, name: &str) -> ActionResult<&str> {
        self.get(name)
            .ok_or_else(|| ActionError::extraction(name, "no value was extracted"))
    }
}

/// Message text first, then the explicit option of the same name. An option
/// that fails the field's format check is rejected, not ignored.
pub fn extract(request: &ActionRequest, schema: &ParamSchema) -> ActionResult<ExtractedParams> {
    let mut values = Vec::with_capacity(schema.fields.len());
    for field in schema.fields {
        if let Some(found) = field.kind.find_in(&request.text) {
            values.push((field.name, found));
            continue;
        }

        let option = std::iter::once(field.name)
            .chain(field.aliases.iter().copied())
            .find_map(|key| request.option_str(key));
        match option {
            Some(value) if field.kind.accepts(&value) => values.push((field.name, value)),
            Some(value) => {
                return Err(ActionError::invalid(
                    field.name,
                    format!("'{}' is not well formed. {}", value, field.kind.hint()),
                ))
            }
            None if field.required => {
                return Err(ActionError::extraction(field.name, field.kind.hint()))
            }
            None => {}
        }
    }
    Ok(ExtractedParams { values })
}

// --- Token creation ---

pub const DEFAULT_TOTAL_SUPPLY: &str = "1000000000000000000000000000";

const TOKEN_HINT: &str =
    "Please provide token name and symbol. Example: 'create token BROLAB with symbol BRO and total supply 1000000000'";

lazy_static! {
    // Most specific phrasing first; the first pattern with a usable capture wins.
    static ref NAME_RULES: Vec<Regex> = [
        r"(?i)\btoken\s+(?:called|named)\s+([a-z0-9]+)",
        r"(?i)\bcreate\s+(?:a\s+)?(?:new\s+)?token\s+([a-z0-9]+)",
        r"(?i)\bmake\s+(?:a\s+)?(?:new\s+)?token\s+([a-z0-9]+)",
        r"(?i)\b(?:called|named)\s+([a-z0-9]+)",
        r"(?i)\btoken\s+([a-z0-9]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect();

    static ref SYMBOL_RULES: Vec<Regex> = [
        r"(?i)\bwith\s+(?:the\s+)?symbol\s+([a-z0-9]+)",
        r"(?i)-\s*symbol\s+([a-z0-9]+)",
        r"(?i)\bsymbol\s+([a-z0-9]+)",
        r"(?i)\(([a-z0-9]+)\)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect();

    static ref SUPPLY_RULE: Regex = Regex::new(
        r"(?i)\bsupply\s+(?:of\s+)?(\d[\d,]*(?:\.\d+)?)(?:\s*(thousand|million|billion|trillion)\b)?"
    )
    .expect("static regex");
}

// Connective words the loose patterns would otherwise capture as a name.
const STOP_WORDS: &[&str] = &[
    "with", "and", "called", "named", "symbol", "supply", "of", "for", "on", "that", "the", "a",
];

fn first_capture(rules: &[Regex], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        rule.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|word| !STOP_WORDS.contains(&word.to_lowercase().as_str()))
            .map(str::to_uppercase)
    })
}

fn magnitude(word: &str) -> u32 {
    match word.to_lowercase().as_str() {
        "thousand" => 3,
        "million" => 6,
        "billion" => 9,
        "trillion" => 12,
        _ => 0,
    }
}

/// Whole-token supply phrase from the text, scaled by 10^decimals into base units.
fn supply_from_text(text: &str, decimals: u32) -> ActionResult<Option<String>> {
    let Some(caps) = SUPPLY_RULE.captures(text) else {
        return Ok(None);
    };
    let number = caps[1].replace(',', "");
    let scale = caps.get(2).map(|m| magnitude(m.as_str())).unwrap_or(0);
    let base = parse_units(&number, decimals + scale)?;
    if base.is_zero() {
        return Err(ActionError::invalid("total supply", "must be greater than zero"));
    }
    Ok(Some(base.to_string()))
}

fn decimals_option(request: &ActionRequest) -> ActionResult<u32> {
    match request.option_str("decimals") {
        None => Ok(NEAR_TOKEN_DECIMALS),
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|d| *d <= MAX_DECIMALS)
            .ok_or_else(|| ActionError::invalid("decimals", format!("'{}' is not a valid precision", raw))),
    }
}

fn supply_option(request: &ActionRequest) -> ActionResult<Option<String>> {
    let Some(raw) = request
        .option_str("totalSupply")
        .or_else(|| request.option_str("total_supply"))
    else {
        return Ok(None);
    };
    let supply = U256::from_dec_str(&raw)
        .map_err(|_| ActionError::invalid("total supply", format!("'{}' is not an integer amount of base units", raw)))?;
    Ok(Some(supply.to_string()))
}

/// Name, symbol and supply for a new token.
///
/// From text: a name alone doubles as the symbol and a symbol alone gets
/// the name `TOKEN`. Without either in the text, the `name` / `symbol` /
/// `totalSupply` options are used.
pub fn extract_token_spec(request: &ActionRequest) -> ActionResult<TokenSpec> {
    let decimals = decimals_option(request)?;
    let icon = request.option_str("icon");

    let name = first_capture(&NAME_RULES, &request.text);
    let symbol = first_capture(&SYMBOL_RULES, &request.text);

    let (name, symbol) = match (name, symbol) {
        (Some(name), Some(symbol)) => (name, symbol),
        (Some(name), None) => (name.clone(), name),
        (None, Some(symbol)) => ("TOKEN".to_string(), symbol),
        (None, None) => {
            let name = request.option_str("name").map(|n| n.to_uppercase());
            let symbol = request.option_str("symbol").map(|s| s.to_uppercase());
            match (name, symbol) {
                (Some(name), Some(symbol)) => (name, symbol),
                (Some(name), None) => (name.clone(), name),
                (None, Some(symbol)) => ("TOKEN".to_string(), symbol),
                (None, None) => return Err(ActionError::extraction("token name and symbol", TOKEN_HINT)),
            }
        }
    };

    let total_supply = match supply_from_text(&request.text, decimals)? {
        Some(supply) => supply,
        None => supply_option(request)?.unwrap_or_else(|| DEFAULT_TOTAL_SUPPLY.to_string()),
    };

    Ok(TokenSpec {
        name,
        symbol,
        total_supply,
        decimals,
        icon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    #[test]
    fn finds_the_single_address_in_text() {
        let request = ActionRequest::new(format!("What's the balance of {}?", ADDR));
        let params = extract(&request, &ADDRESS_SCHEMA).unwrap();
        assert_eq!(params.get("address"), Some(ADDR));
    }

    #[test]
    fn missing_address_is_an_extraction_failure() {
        let err = extract(&ActionRequest::new("what's my balance?"), &ADDRESS_SCHEMA).unwrap_err();
        assert!(matches!(err, ActionError::Extraction { ref field, .. } if field == "address"));
    }

    #[test]
    fn address_is_not_cut_from_a_transaction_hash() {
        let hash = format!("0x{}", "ab".repeat(32));
        let err = extract(&ActionRequest::new(format!("look at {}", hash)), &ADDRESS_SCHEMA).unwrap_err();
        assert_eq!(err.kind(), "extraction_failure");

        let params = extract(&ActionRequest::new(format!("look at {}", hash)), &TX_HASH_SCHEMA).unwrap();
        assert_eq!(params.get("tx_hash"), Some(hash.as_str()));
    }

    #[test]
    fn address_glued_to_a_word_is_still_found() {
        let request = ActionRequest::new(format!("airdrop to{}", ADDR));
        let params = extract(&request, &ADDRESS_SCHEMA).unwrap();
        assert_eq!(params.get("address"), Some(ADDR));
    }

    #[test]
    fn falls_back_to_camel_case_option() {
        let hash = format!("0x{}", "1".repeat(64));
        let request = ActionRequest::new("show me that transaction").with_option("txHash", hash.clone());
        let params = extract(&request, &TX_HASH_SCHEMA).unwrap();
        assert_eq!(params.get("tx_hash"), Some(hash.as_str()));

        let bad = ActionRequest::new("show me").with_option("txHash", "0x123");
        assert_eq!(extract(&bad, &TX_HASH_SCHEMA).unwrap_err().kind(), "invalid_parameter");
    }

    #[test]
    fn token_name_symbol_and_scaled_supply() {
        let spec = extract_token_spec(&ActionRequest::new(
            "Create a new token called MyToken with symbol MTK and total supply of 1 million tokens",
        ))
        .unwrap();
        assert_eq!(spec.name, "MYTOKEN");
        assert_eq!(spec.symbol, "MTK");
        assert_eq!(spec.decimals, 24);
        assert_eq!(spec.total_supply, format!("1{}", "0".repeat(30)));
    }

    #[test]
    fn bare_supply_is_scaled_by_yocto() {
        let spec = extract_token_spec(&ActionRequest::new(
            "create token BROLAB with symbol BRO and total supply 1000000000",
        ))
        .unwrap();
        assert_eq!(spec.name, "BROLAB");
        assert_eq!(spec.symbol, "BRO");
        assert_eq!(spec.total_supply, format!("1{}", "0".repeat(33)));
    }

    #[test]
    fn supply_follows_overridden_decimals() {
        let request = ActionRequest::new("create token ROCKET (RKT) with total supply of 1000")
            .with_option("decimals", "6");
        let spec = extract_token_spec(&request).unwrap();
        assert_eq!(spec.decimals, 6);
        assert_eq!(spec.total_supply, "1000000000");

        let no_supply = extract_token_spec(
            &ActionRequest::new("create token ROCKET (RKT)").with_option("decimals", "6"),
        )
        .unwrap();
        assert_eq!(no_supply.total_supply, DEFAULT_TOTAL_SUPPLY);
    }

    #[test]
    fn token_defaults_fill_the_gaps() {
        let only_name = extract_token_spec(&ActionRequest::new("make a token rocket")).unwrap();
        assert_eq!(only_name.name, "ROCKET");
        assert_eq!(only_name.symbol, "ROCKET");
        assert_eq!(only_name.total_supply, DEFAULT_TOTAL_SUPPLY);

        let only_symbol = extract_token_spec(&ActionRequest::new("deploy something (zap)")).unwrap();
        assert_eq!(only_symbol.name, "TOKEN");
        assert_eq!(only_symbol.symbol, "ZAP");
    }

    #[test]
    fn connective_words_are_not_names() {
        let spec = extract_token_spec(&ActionRequest::new("create token with symbol XYZ")).unwrap();
        assert_eq!(spec.symbol, "XYZ");
        assert_eq!(spec.name, "TOKEN");
    }

    #[test]
    fn options_are_used_when_text_has_nothing() {
        let request = ActionRequest::new("please do it")
            .with_option("name", "Gold")
            .with_option("symbol", "gld")
            .with_option("totalSupply", "5000");
        let spec = extract_token_spec(&request).unwrap();
        assert_eq!((spec.name.as_str(), spec.symbol.as_str()), ("GOLD", "GLD"));
        assert_eq!(spec.total_supply, "5000");

        let err = extract_token_spec(&ActionRequest::new("please do it")).unwrap_err();
        assert!(err.to_string().contains("create token BROLAB"));
    }
}
