use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

use anyhow::Context;
use itertools::Itertools;

use crate::problem::tdcarp::{InstanceHeader, ParsedInstance, RawConnection};
use crate::problem::{ConvertError, Time};

/**
TDCARP instance files start with ten header lines of the form

    <label> : <value>

in fixed order: name, vertex count, required edge count, non-required edge
count, vehicle count, capacity, depot, horizon start, horizon end, service
speed factor. The labels are not interpreted, only the position matters.

A single delimiter line follows the header and marks the start of the
network records. Each remaining non-empty line describes one connection:

    tail head distance demand period_count [ e1 ... e_{k-1} ] [ s1 ... sk ]

with k = period_count. All tokens are whitespace-separated; the bracket
characters are standalone structural tokens. The e_i are the boundaries of
the first k - 1 speed periods (strictly increasing, below the horizon end);
the boundary of the last period is not encoded, it is the horizon end.
 */
pub(crate) fn load_instance(path: impl AsRef<Path>) -> anyhow::Result<ParsedInstance> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening instance file {}", path.display()))?;
    let file = BufReader::new(&f);

    read_instance(file).with_context(|| format!("parsing instance file {}", path.display()))
}

pub fn read_instance<B: BufRead>(reader: B) -> anyhow::Result<ParsedInstance> {
    let mut lines = LineReader::new(reader);

    let header = read_header(&mut lines)?;
    let connections = read_connections(&mut lines, header.horizon.1)?;

    Ok(ParsedInstance {
        header,
        connections,
    })
}

struct LineReader<B> {
    lines: Lines<B>,
    line_no: usize,
}

impl<B: BufRead> LineReader<B> {
    fn new(reader: B) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    fn next_line(&mut self) -> anyhow::Result<String> {
        self.line_no += 1;
        match self.lines.next() {
            Some(line) => Ok(line?),
            None => Err(ConvertError::Format {
                line: self.line_no,
                reason: "unexpected end of file".to_string(),
            }
            .into()),
        }
    }
}

fn header_value<B: BufRead>(lines: &mut LineReader<B>) -> anyhow::Result<String> {
    let line = lines.next_line()?;
    let (_label, value) = line.split_once(" : ").ok_or_else(|| ConvertError::Format {
        line: lines.line_no,
        reason: format!("expected `<label> : <value>`, got `{}`", line),
    })?;
    Ok(value.trim_end().to_string())
}

fn header_number<B: BufRead, T: FromStr>(lines: &mut LineReader<B>) -> anyhow::Result<T> {
    let value = header_value(lines)?;
    value.parse::<T>().map_err(|_| {
        ConvertError::Format {
            line: lines.line_no,
            reason: format!("invalid numeric value `{}`", value),
        }
        .into()
    })
}

fn read_header<B: BufRead>(lines: &mut LineReader<B>) -> anyhow::Result<InstanceHeader> {
    let name = header_value(lines)?;
    let vertex_count = header_number(lines)?;
    let required_edge_count = header_number(lines)?;
    let nonrequired_edge_count = header_number(lines)?;
    let vehicle_count = header_number(lines)?;
    let capacity = header_number(lines)?;
    let depot = header_number(lines)?;
    let start_time: Time = header_number(lines)?;
    let end_time: Time = header_number(lines)?;
    let service_speed_factor: f64 = header_number(lines)?;

    let header_error = |reason: String| ConvertError::Format {
        line: lines.line_no,
        reason,
    };
    if depot >= vertex_count {
        return Err(header_error(format!(
            "depot {} outside vertex range 0..{}",
            depot, vertex_count
        ))
        .into());
    }
    if start_time >= end_time {
        return Err(header_error(format!(
            "horizon start {} not before horizon end {}",
            start_time, end_time
        ))
        .into());
    }
    if service_speed_factor <= 0.0 {
        return Err(header_error(format!(
            "service speed factor {} not positive",
            service_speed_factor
        ))
        .into());
    }

    // delimiter line between the header and the network records
    lines.next_line()?;

    Ok(InstanceHeader {
        name,
        vertex_count,
        required_edge_count,
        nonrequired_edge_count,
        vehicle_count,
        capacity,
        depot,
        horizon: (start_time, end_time),
        service_speed_factor,
    })
}

fn read_connections<B: BufRead>(
    lines: &mut LineReader<B>,
    horizon_end: Time,
) -> anyhow::Result<Vec<RawConnection>> {
    let mut connections = vec![];
    loop {
        let line = match lines.lines.next() {
            Some(line) => line?,
            None => break,
        };
        lines.line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        connections.push(parse_connection_line(lines.line_no, &line, horizon_end)?);
    }
    Ok(connections)
}

/// Token cursor over one record line. The brackets are consumed as markers,
/// never as data, so no token-index arithmetic is needed.
struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(line_no: usize, line: &'a str) -> Self {
        Self {
            iter: line.split_whitespace(),
            line: line_no,
        }
    }

    fn next_token(&mut self) -> Result<&'a str, ConvertError> {
        self.iter.next().ok_or_else(|| ConvertError::Format {
            line: self.line,
            reason: "unexpected end of line".to_string(),
        })
    }

    fn number<T: FromStr>(&mut self) -> Result<T, ConvertError> {
        let token = self.next_token()?;
        token.parse::<T>().map_err(|_| ConvertError::Format {
            line: self.line,
            reason: format!("invalid numeric token `{}`", token),
        })
    }

    fn marker(&mut self, expected: &str) -> Result<(), ConvertError> {
        let token = self.next_token()?;
        if token == expected {
            Ok(())
        } else {
            Err(ConvertError::Format {
                line: self.line,
                reason: format!("expected `{}`, got `{}`", expected, token),
            })
        }
    }

    fn finish(mut self) -> Result<(), ConvertError> {
        match self.iter.next() {
            None => Ok(()),
            Some(token) => Err(ConvertError::Format {
                line: self.line,
                reason: format!("trailing token `{}`", token),
            }),
        }
    }
}

fn parse_connection_line(
    line_no: usize,
    line: &str,
    horizon_end: Time,
) -> Result<RawConnection, ConvertError> {
    let mut tokens = Tokens::new(line_no, line);
    let format_error = |reason: String| ConvertError::Format {
        line: line_no,
        reason,
    };

    let tail = tokens.number()?;
    let head = tokens.number()?;
    let distance = tokens.number()?;
    let demand = tokens.number()?;
    let period_count: usize = tokens.number()?;
    if period_count < 1 {
        return Err(format_error("period count must be at least 1".to_string()));
    }

    tokens.marker("[")?;
    let mut period_ends: Vec<Time> = Vec::with_capacity(period_count - 1);
    for _ in 0..period_count - 1 {
        period_ends.push(tokens.number()?);
    }
    tokens.marker("]")?;

    tokens.marker("[")?;
    let mut period_speeds: Vec<f64> = Vec::with_capacity(period_count);
    for _ in 0..period_count {
        period_speeds.push(tokens.number()?);
    }
    tokens.marker("]")?;
    tokens.finish()?;

    if !period_ends.iter().tuple_windows().all(|(a, b)| a < b) {
        return Err(format_error(format!(
            "period ends {:?} not strictly increasing",
            period_ends
        )));
    }
    if let Some(last) = period_ends.last() {
        if *last >= horizon_end {
            return Err(format_error(format!(
                "period end {} not below horizon end {}",
                last, horizon_end
            )));
        }
    }
    if let Some(speed) = period_speeds.iter().find(|it| **it <= 0.0) {
        return Err(format_error(format!("period speed {} not positive", speed)));
    }

    Ok(RawConnection {
        tail,
        head,
        distance,
        demand,
        period_count,
        period_ends,
        period_speeds,
    })
}
