use std::cmp::Ordering;

/// Validate an IPv4 address (e.g., "192.168.1.1").
/// Returns true if the string is a valid dotted-decimal IPv4 address.
pub fn is_valid_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts
        .iter()
        .all(|p| !p.is_empty() && p.len() <= 3 && p.chars().all(|c| c.is_ascii_digit()) && p.parse::<u8>().is_ok())
}

/// Validate "address" or "address/prefix" with prefix 0-32
pub fn is_valid_ipv4_cidr(value: &str) -> bool {
    match value.split_once('/') {
        Some((addr, prefix)) => {
            is_valid_ipv4(addr)
                && !prefix.is_empty()
                && prefix.chars().all(|c| c.is_ascii_digit())
                && prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false)
        }
        None => is_valid_ipv4(value),
    }
}

/// Compare names the way an operator expects: digit runs compare
/// numerically, so "eth2" sorts before "eth10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_chunk(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }

    // Equal under natural rules ("eth01" vs "eth1"): keep the order total
    a.cmp(b)
}

/// Sort a slice in place by a name key using `natural_cmp`
pub fn natural_sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| natural_cmp(key(a), key(b)));
}

fn compare_chunk(l: &str, r: &str) -> Ordering {
    let l_digits = l.starts_with(|c: char| c.is_ascii_digit());
    let r_digits = r.starts_with(|c: char| c.is_ascii_digit());

    match (l_digits, r_digits) {
        (true, true) => {
            // Compare without parsing so arbitrarily long runs never overflow
            let l_trim = l.trim_start_matches('0');
            let r_trim = r.trim_start_matches('0');
            l_trim
                .len()
                .cmp(&r_trim.len())
                .then_with(|| l_trim.cmp(r_trim))
        }
        // digits sort before letters
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => l.to_lowercase().cmp(&r.to_lowercase()),
    }
}

/// Splits a string into alternating digit / non-digit runs
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}
