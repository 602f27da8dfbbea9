//! Parsers for the `--noheadings` reports printed by `vgs` and `pvs`.
//!
//! Those reports are one value per line, padded with leading blanks, e.g.
//! ```text
//!   /dev/sdb
//!   /dev/sdc
//! ```
//! and, for sizes queried with `--units m`,
//! ```text
//!   <476937.00m
//! ```
//! where the `<` marks a rounded down value.

use nom::bytes::complete::take_till1;
use nom::character::complete::{char, multispace0, multispace1, one_of};
use nom::combinator::{all_consuming, opt, verify};
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, terminated};
use nom::IResult;

use crate::Error;

fn field(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(multispace0, separated_list1(multispace1, field), multispace0)(input)
}

fn size_mb(input: &str) -> IResult<&str, f64> {
    delimited(
        multispace0,
        preceded(
            opt(char('<')),
            terminated(verify(double, |size: &f64| size.is_finite()), opt(one_of("mM"))),
        ),
        multispace0,
    )(input)
}

/// Physical volume names from `vgs --noheadings -o pv_name`.
pub(crate) fn parse_pv_names(output: &str) -> Result<Vec<String>, Error> {
    let (_, names) = all_consuming(fields)(output).map_err(|e| Error::ReportParse {
        command: "vgs".to_string(),
        error: e.to_string(),
    })?;
    Ok(names.into_iter().map(str::to_owned).collect())
}

/// Size in megabytes from `pvs --noheadings --units m -o pv_size`.
pub(crate) fn parse_pv_size(output: &str) -> Result<f64, Error> {
    let (_, size) = all_consuming(size_mb)(output).map_err(|e| Error::ReportParse {
        command: "pvs".to_string(),
        error: e.to_string(),
    })?;
    Ok(size)
}
