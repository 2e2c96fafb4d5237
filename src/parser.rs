//! Instance readers for the MiniZinc data layout (`.dzn`) and the raw
//! benchmark layout (`.dat`).

use crate::errors::*;
use crate::model::Instance;
use regex::Regex;
use std::io::BufRead;
use std::path::Path;

fn malformed<T>(msg: String) -> Result<T> {
    Err(ErrorKind::MalformedInstance(msg).into())
}

fn numbers(text: &str) -> Result<Vec<u64>> {
    let re = Regex::new(r"\d+")?;
    re.find_iter(text)
        .map(|m| m.as_str().parse::<u64>().map_err(Error::from))
        .collect()
}

fn scalar(text: &str, name: &str) -> Result<usize> {
    let re = Regex::new(&format!(r"(?m)^\s*{}\s*=\s*(\d+)\s*;", name))?;
    match re.captures(text) {
        Some(cap) => Ok(cap[1].parse()?),
        None => malformed(format!("missing '{}'", name)),
    }
}

fn array(text: &str, name: &str) -> Result<Vec<u64>> {
    let re = Regex::new(&format!(r"(?m)^\s*{}\s*=\s*\[([^\]]*)\]\s*;", name))?;
    match re.captures(text) {
        Some(cap) => numbers(&cap[1]),
        None => malformed(format!("missing '{}'", name)),
    }
}

fn matrix(text: &str, name: &str) -> Result<Vec<Vec<u64>>> {
    let re = Regex::new(&format!(r"(?ms)^\s*{}\s*=\s*\[\|(.*?)\|\]\s*;", name))?;
    let body = match re.captures(text) {
        Some(cap) => cap[1].to_owned(),
        None => return malformed(format!("missing '{}'", name)),
    };
    body.split('|')
        .filter(|row| !row.trim().is_empty())
        .map(numbers)
        .collect()
}

/// Parse the `.dzn` text of an instance.
///
/// Only the layout matters: `m = …; n = …; l = [...]; s = [...];` and the
/// distance matrix as `D = [| … | … |];`. Comments start with `%`.
pub fn parse_dzn(text: &str) -> Result<Instance> {
    let text: String = text
        .lines()
        .map(|line| line.split('%').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Instance {
        m: scalar(&text, "m")?,
        n: scalar(&text, "n")?,
        l: array(&text, "l")?,
        s: array(&text, "s")?,
        d: matrix(&text, "D")?,
    })
}

/// Parse the whitespace separated `.dat` layout: `m`, `n`, the capacities,
/// the sizes and `n + 1` rows of distances, one item per line.
pub fn parse_dat(text: &str) -> Result<Instance> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let mut next = |what: &str| match lines.next() {
        Some(line) => Ok(line),
        None => malformed(format!("missing {}", what)),
    };
    let m: usize = next("m")?.parse()?;
    let n: usize = next("n")?.parse()?;
    let l = numbers(next("capacities")?)?;
    let s = numbers(next("sizes")?)?;
    let mut d = Vec::with_capacity(n + 1);
    for i in 0..=n {
        d.push(numbers(next(&format!("distance row {}", i))?)?);
    }
    Ok(Instance { m, n, l, s, d })
}

/// Read a `.dzn` instance from a buffered reader.
pub fn parse_dzn_from_buf_reader<F>(reader: &mut F) -> Result<Instance>
where
    F: BufRead,
{
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_dzn(&text)
}

/// Read an instance file, picking the layout from its extension.
pub fn parse_instance<P: AsRef<Path>>(path: P) -> Result<Instance> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .chain_err(|| format!("cannot read instance {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("dat") => parse_dat(&text),
        _ => parse_dzn(&text),
    }
}
