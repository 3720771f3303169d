use anyhow::{Result, bail};

const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a deduplicated list.
///
/// Accepts decimal integers (negatives use their magnitude) and `0x`-prefixed hex.
/// An empty list falls back to the default seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = parse_seed(token)?;
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_seed(token: &str) -> Result<u64> {
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return match u64::from_str_radix(hex, 16) {
            Ok(value) => Ok(value),
            Err(err) => bail!("Unrecognized seed token: {token} ({err})"),
        };
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    bail!("Unrecognized seed token: {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_negative() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xC0FFEE", "42"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 0xC0_FFEE]);
    }

    #[test]
    fn falls_back_to_default_and_rejects_words() {
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert!(resolve_seed_inputs(&tokens(&["ORANGE42"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
