//! Very thin reader and writer of the text problem format.
//! A problem consists of sections separated by lines of dashes:
//! an optional iteration count, the sequence, the alphabet, the states,
//! the transition table, and the emission table.
//! The tables have a header of column labels, and each row starts with its label.
use crate::error::{HmmError, Result};
use crate::hmm::HMM;
use std::io::{BufRead, BufReader, Read};

pub const DELIMITER: &str = "--------";

/// A parsed problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// The number of iterations, given only to the learning problems.
    pub iterations: Option<usize>,
    /// Observed sequence, encoded into symbol indices.
    pub sequence: Vec<usize>,
    pub model: HMM,
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(iterations) = self.iterations {
            writeln!(f, "{}\n{}", iterations, DELIMITER)?;
        }
        let symbols = self.model.symbol_labels();
        let seq: String = self.sequence.iter().map(|&x| symbols[x].as_str()).collect();
        writeln!(f, "{}\n{}", seq, DELIMITER)?;
        writeln!(f, "{}\n{}", symbols.join("\t"), DELIMITER)?;
        let states = self.model.state_labels();
        writeln!(f, "{}\n{}", states.join("\t"), DELIMITER)?;
        write!(f, "{}", self.model)
    }
}

// A non-empty line with its 1-based line number.
type Line<'a> = (usize, &'a str);

fn is_delimiter(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-')
}

fn parse_error(line: usize, reason: String) -> HmmError {
    HmmError::Parse { line, reason }
}

// Split `contents` into sections of non-empty lines.
fn split_sections(contents: &str) -> Vec<Vec<Line>> {
    let mut sections = vec![vec![]];
    for (idx, line) in contents.lines().enumerate() {
        if is_delimiter(line) {
            sections.push(vec![]);
        } else if !line.trim().is_empty() {
            if let Some(section) = sections.last_mut() {
                section.push((idx + 1, line));
            }
        }
    }
    sections
}

// Return the only line of `section`.
fn single_line<'a>(section: &[Line<'a>], name: &str, end: usize) -> Result<Line<'a>> {
    match section {
        [line] => Ok(*line),
        [] => Err(parse_error(end, format!("missing {}", name))),
        [_, (line, _), ..] => Err(parse_error(*line, format!("{} should be a single line", name))),
    }
}

// Parse a table whose rows are `rows` and columns are `columns`.
fn parse_table(
    section: &[Line],
    name: &str,
    rows: &[String],
    columns: &[String],
    end: usize,
) -> Result<Vec<Vec<f64>>> {
    let ((header_line, header), body) = match section.split_first() {
        Some(res) => res,
        None => return Err(parse_error(end, format!("missing {} table", name))),
    };
    let header: Vec<_> = header.split_whitespace().collect();
    if header != columns {
        let msg = format!("line {}: header of {} table {:?}, expected {:?}", header_line, name, header, columns);
        return Err(HmmError::Shape(msg));
    }
    if body.len() != rows.len() {
        let msg = format!("{} table has {} rows, expected {}", name, body.len(), rows.len());
        return Err(HmmError::Shape(msg));
    }
    body.iter()
        .zip(rows.iter())
        .map(|(&(line, content), expected)| {
            let mut fields = content.split_whitespace();
            let label = fields.next().unwrap_or_default();
            if label != expected {
                let msg = format!("line {}: row `{}` of {} table, expected `{}`", line, label, name, expected);
                return Err(HmmError::Shape(msg));
            }
            fields
                .map(|x| {
                    x.parse::<f64>()
                        .map_err(|e| parse_error(line, format!("`{}` is not a number: {}", x, e)))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}

/// Parse a problem. If there are six sections, the first one should be the number of iterations.
pub fn parse_problem(contents: &str) -> Result<Problem> {
    let end = contents.lines().count();
    let mut sections = split_sections(contents);
    let iterations = match sections.len() {
        5 => None,
        6 => {
            let (line, content) = single_line(&sections.remove(0), "iteration count", end)?;
            let content = content.trim();
            let iterations = content
                .parse::<usize>()
                .map_err(|e| parse_error(line, format!("`{}` is not an iteration count: {}", content, e)))?;
            Some(iterations)
        }
        len => return Err(parse_error(end, format!("{} sections, expected 5 or 6", len))),
    };
    let (_, seq) = single_line(&sections[0], "sequence", end)?;
    let (_, symbols) = single_line(&sections[1], "alphabet", end)?;
    let (_, states) = single_line(&sections[2], "states", end)?;
    let symbols: Vec<String> = symbols.split_whitespace().map(|x| x.to_string()).collect();
    let states: Vec<String> = states.split_whitespace().map(|x| x.to_string()).collect();
    let transition = parse_table(&sections[3], "transition", &states, &states, end)?;
    let emission = parse_table(&sections[4], "emission", &states, &symbols, end)?;
    let model = HMM::new(&states, &symbols, &transition, &emission)?;
    let sequence = model.encode(seq)?;
    debug!("PARSED\t{}\t{}\t{}", states.len(), symbols.len(), sequence.len());
    Ok(Problem {
        iterations,
        sequence,
        model,
    })
}

/// Read file or stdin, return the parsed problem.
pub fn read_problem<P: AsRef<std::path::Path>>(file: &Option<P>) -> Result<Problem> {
    let stdin = std::io::stdin();
    let mut reader: Box<dyn BufRead> = match file {
        Some(file) => std::fs::File::open(file).map(BufReader::new).map(Box::new)?,
        None => Box::new(BufReader::new(stdin.lock())),
    };
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    parse_problem(&contents)
}

/// Round `x` to three decimals and print it in the shortest form, keeping at least one decimal.
/// E.g., 0 -> "0.0", 0.75 -> "0.75", 0.0109 -> "0.011".
pub fn format_prob(x: f64) -> String {
    let x = (x * 1000f64).round() / 1000f64;
    if x.fract() == 0f64 {
        format!("{:.1}", x)
    } else {
        format!("{}", x)
    }
}

/// The transition table, the delimiter, and the emission table.
pub fn format_tables(hmm: &HMM) -> String {
    hmm.to_string()
}

/// State labels of `path`, without any separator.
pub fn format_path(hmm: &HMM, path: &[usize]) -> String {
    hmm.decode_labels(path).concat()
}

pub fn format_probability(prob: f64) -> String {
    format!("{:e}", prob)
}

#[cfg(test)]
mod tests {
    use super::*;
    const PROBABILITY: &str = "xzyyzzyzyy
--------
x\ty\tz
--------
A\tB
--------
\tA\tB
A\t0.303\t0.697
B\t0.831\t0.169
--------
\tx\ty\tz
A\t0.533\t0.065\t0.402
B\t0.342\t0.334\t0.324
";
    const LEARNING: &str = "100
--------
xxxzyzzxxzxyzxzxyxxzyzyzyyyyzzxxxzzxzyzzzxyxzzzxyzzxxxxzzzxyyxzzzzzyzzzxxzzxxxyxyzzyxzxxxyxzyxxyzyxz
--------
x   y   z
--------
A   B
--------
    A   B
A   0.582   0.418
B   0.272   0.728
--------
    x   y   z
A   0.129   0.35    0.52
B   0.422   0.151   0.426
";
    #[test]
    fn parse_probability_problem() {
        let problem = parse_problem(PROBABILITY).unwrap();
        assert_eq!(problem.iterations, None);
        assert_eq!(problem.sequence, vec![0, 2, 1, 1, 2, 2, 1, 2, 1, 1]);
        let hmm = &problem.model;
        assert_eq!(hmm.state_labels(), &["A".to_string(), "B".to_string()]);
        assert_eq!(hmm.transitions(1), &[0.831, 0.169]);
        assert_eq!(hmm.emissions(0), &[0.533, 0.065, 0.402]);
        let lk = hmm.likelihood(&problem.sequence).unwrap();
        let formatted = format_probability(lk);
        assert!(formatted.starts_with("1.10055103196948"), "{}", formatted);
        assert!(formatted.ends_with("e-6"), "{}", formatted);
    }
    #[test]
    fn parse_learning_problem() {
        let problem = parse_problem(LEARNING).unwrap();
        assert_eq!(problem.iterations, Some(100));
        assert_eq!(problem.sequence.len(), 100);
        assert_eq!(problem.model.symbols(), 3);
        assert_eq!(problem.model.emissions(1), &[0.422, 0.151, 0.426]);
    }
    #[test]
    fn display_and_parse() {
        let mut problem = parse_problem(LEARNING).unwrap();
        problem.iterations = Some(3);
        let reparsed = parse_problem(&problem.to_string()).unwrap();
        assert_eq!(problem, reparsed);
    }
    #[test]
    fn parse_errors() {
        let res = parse_problem("xyz\n--------\nx y z\n");
        assert!(matches!(res, Err(HmmError::Parse { .. })), "{:?}", res);
        let broken = PROBABILITY.replace("0.831", "0.8e1x");
        match parse_problem(&broken) {
            Err(HmmError::Parse { line, .. }) => assert_eq!(line, 9),
            res => panic!("{:?}", res),
        }
        let broken = LEARNING.replacen("100", "many", 1);
        match parse_problem(&broken) {
            Err(HmmError::Parse { line, .. }) => assert_eq!(line, 1),
            res => panic!("{:?}", res),
        }
    }
    #[test]
    fn label_errors() {
        let broken = PROBABILITY.replace("\tA\tB\n", "\tB\tA\n");
        let res = parse_problem(&broken);
        assert!(matches!(res, Err(HmmError::Shape(_))), "{:?}", res);
        let broken = PROBABILITY.replace("B\t0.342", "C\t0.342");
        let res = parse_problem(&broken);
        assert!(matches!(res, Err(HmmError::Shape(_))), "{:?}", res);
        let broken = PROBABILITY.replacen("xzyy", "xwyy", 1);
        let res = parse_problem(&broken);
        assert!(matches!(res, Err(HmmError::Shape(_))), "{:?}", res);
        let broken = PROBABILITY.replace("A\t0.303\t0.697", "A\t0.303\t0.6");
        let res = parse_problem(&broken);
        assert!(matches!(res, Err(HmmError::Normalization { .. })), "{:?}", res);
    }
    #[test]
    fn format_prob_test() {
        assert_eq!(format_prob(0f64), "0.0");
        assert_eq!(format_prob(1f64), "1.0");
        assert_eq!(format_prob(0.75), "0.75");
        assert_eq!(format_prob(0.010989), "0.011");
        assert_eq!(format_prob(0.98901), "0.989");
        assert_eq!(format_prob(0.0004), "0.0");
        assert_eq!(format_prob(0.5), "0.5");
    }
    #[test]
    fn format_output() {
        let problem = parse_problem(LEARNING).unwrap();
        let tables = format_tables(&problem.model);
        let lines: Vec<_> = tables.lines().collect();
        assert_eq!(lines[2], "B\t0.272\t0.728");
        assert_eq!(lines[3], DELIMITER);
        assert_eq!(lines[5], "A\t0.129\t0.35\t0.52");
        assert_eq!(format_path(&problem.model, &[0, 1, 1, 0]), "ABBA");
    }
}
