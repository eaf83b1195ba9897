//! Lexer and parser for the emulator REPL.
//!
//! The lexer uses `regal` to produce a bounded token stream; the parser
//! composes `winnow` combinators over those tokens to build [`Command`]
//! values. Nothing here allocates.

use core::fmt;
use core::ops::Range;
use core::time::Duration;

use heapless::Vec as HeaplessVec;
use regal::IncrementalError;
use regal::TokenCache;
use regal_macros::RegalLexer;
#[allow(deprecated)]
use winnow::error::ErrorKind;
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::stream::Stream;

use super::catalog::{self, CommandTag};
use crate::devices::SensorId;
use crate::routines::RoutineKind;
use crate::timers::TimerId;

/// Maximum number of tokens produced per REPL line.
pub const MAX_TOKENS: usize = 16;
const MAX_CACHE_RECORDS: usize = MAX_TOKENS * 2;

/// Upper bound for a single `tick` batch.
pub const MAX_TICK_COUNT: u32 = 60_000;

/// Lexical token kinds recognized by the REPL grammar.
#[derive(RegalLexer, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TokenKind {
    /// Duration literal ending in `ms` or `s`.
    #[regex(r"[0-9]+(?:ms|s)", priority = 2)]
    Duration,
    /// Integer literal, optionally negative.
    #[regex(r"-?[0-9]+")]
    Integer,
    /// Identifier or keyword (case-insensitive match performed later).
    #[regex(r"[A-Za-z][A-Za-z0-9-]*")]
    Ident,
    #[regex(r"[ \t]+", skip)]
    Whitespace,
    /// End-of-line token (`\r`, `\n`, or `\r\n`).
    #[token("\r\n")]
    #[token("\n")]
    #[token("\r")]
    Eol,
    /// Pseudo variant used when the lexer encounters unsupported input.
    #[default]
    #[regex(r".", priority = 1024)]
    Error,
}

/// Token emitted by the lexer with a byte span back into the source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Range<usize>,
}

/// Bounded token buffer.
pub type TokenBuffer<'a> = HeaplessVec<Token<'a>, MAX_TOKENS>;

/// Lexer errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    /// Input produced more tokens than the static buffer allows.
    TooManyTokens { processed: usize },
    /// Underlying lexer reported an unrecoverable error.
    Engine,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::TooManyTokens { processed } => {
                write!(f, "token buffer exhausted after {processed} items")
            }
            LexError::Engine => write!(f, "lexer engine error"),
        }
    }
}

/// Grammar errors emitted by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrammarErrorKind<'a> {
    UnexpectedToken {
        expected: &'static str,
        found: Option<TokenKind>,
        span: Range<usize>,
    },
    UnexpectedEnd {
        expected: &'static str,
    },
    InvalidInteger {
        span: Range<usize>,
    },
    InvalidDuration {
        span: Range<usize>,
    },
    InvalidToken {
        span: Range<usize>,
        lexeme: &'a str,
    },
    UnknownRoutine {
        span: Range<usize>,
        lexeme: &'a str,
    },
    UnknownSensor {
        span: Range<usize>,
        lexeme: &'a str,
    },
}

impl fmt::Display for GrammarErrorKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarErrorKind::UnexpectedToken {
                expected,
                found,
                span,
            } => write!(f, "expected {expected}, found {found:?} at {span:?}"),
            GrammarErrorKind::UnexpectedEnd { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            GrammarErrorKind::InvalidInteger { span } => {
                write!(f, "invalid integer literal at {span:?}")
            }
            GrammarErrorKind::InvalidDuration { span } => {
                write!(f, "invalid duration literal at {span:?}")
            }
            GrammarErrorKind::InvalidToken { span, lexeme } => {
                write!(f, "unsupported token `{lexeme}` at {span:?}")
            }
            GrammarErrorKind::UnknownRoutine { lexeme, .. } => {
                write!(f, "unknown routine `{lexeme}`")
            }
            GrammarErrorKind::UnknownSensor { lexeme, .. } => {
                write!(f, "unknown sensor `{lexeme}`")
            }
        }
    }
}

/// Wrapper type enabling a consistent error surface for consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarError<'a> {
    pub kind: GrammarErrorKind<'a>,
}

impl fmt::Display for GrammarError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl<'a> GrammarError<'a> {
    fn unexpected(expected: &'static str, token: Option<&Token<'a>>) -> Self {
        GrammarError {
            kind: match token {
                Some(tok) => GrammarErrorKind::UnexpectedToken {
                    expected,
                    found: Some(tok.kind),
                    span: tok.span.clone(),
                },
                None => GrammarErrorKind::UnexpectedEnd { expected },
            },
        }
    }

    fn invalid_integer(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidInteger {
                span: token.span.clone(),
            },
        }
    }

    fn invalid_duration(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidDuration {
                span: token.span.clone(),
            },
        }
    }

    fn invalid_token(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::InvalidToken {
                span: token.span.clone(),
                lexeme: token.lexeme,
            },
        }
    }

    fn unknown_routine(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::UnknownRoutine {
                span: token.span.clone(),
                lexeme: token.lexeme,
            },
        }
    }

    fn unknown_sensor(token: &Token<'a>) -> Self {
        GrammarError {
            kind: GrammarErrorKind::UnknownSensor {
                span: token.span.clone(),
                lexeme: token.lexeme,
            },
        }
    }
}

type Input<'src, 'slice> = &'slice [Token<'src>];

#[allow(deprecated)]
impl<'src, 'slice> ParserError<Input<'src, 'slice>> for GrammarError<'src>
where
    'src: 'slice,
{
    fn from_error_kind(input: &Input<'src, 'slice>, _kind: ErrorKind) -> Self {
        GrammarError::unexpected("token", input.first())
    }

    fn append(
        self,
        _input: &Input<'src, 'slice>,
        _token_start: &<Input<'src, 'slice> as Stream>::Checkpoint,
        _kind: ErrorKind,
    ) -> Self {
        self
    }

    fn or(self, other: Self) -> Self {
        other
    }
}

/// Combined lex/parse error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError<'a> {
    Lex(LexError),
    Grammar(GrammarError<'a>),
}

impl fmt::Display for ParseError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => write!(f, "{err}"),
            ParseError::Grammar(err) => write!(f, "{err}"),
        }
    }
}

/// Structured commands produced by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Run(RoutineKind),
    Tick(u32),
    Advance(Duration),
    Sensor(SensorCommand),
    Cancel,
    Arm(TimerId),
    Disarm(TimerId),
    Status,
    Help(HelpCommand<'a>),
}

/// Forced reading for a simulated sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorOverride {
    Value(i32),
    /// Reads report the sensor as unavailable.
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorCommand {
    pub sensor: SensorId,
    pub reading: SensorOverride,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpCommand<'a> {
    pub topic: Option<&'a str>,
}

/// Tokenize the provided line.
pub fn lex(line: &str) -> Result<TokenBuffer<'_>, LexError> {
    let compiled = TokenKind::lexer();
    let mut cache: TokenCache<TokenKind, MAX_CACHE_RECORDS> = TokenCache::new();
    let partial = cache
        .rebuild(compiled, line)
        .map_err(map_incremental_error)?;
    let mut buffer = TokenBuffer::new();

    for record in cache.tokens() {
        if record.skipped {
            continue;
        }

        let span = record.start..record.end;
        let lexeme = &line[span.clone()];
        push_token(
            &mut buffer,
            Token {
                kind: record.token,
                lexeme,
                span,
            },
        )?;
    }

    if let Some(partial) = partial.filter(|partial| !partial.fragment.is_empty()) {
        let start = partial.start;
        let span = start..start + partial.fragment.len();
        push_token(
            &mut buffer,
            Token {
                kind: TokenKind::Error,
                lexeme: partial.fragment,
                span,
            },
        )?;
    }

    Ok(buffer)
}

fn push_token<'a>(buffer: &mut TokenBuffer<'a>, token: Token<'a>) -> Result<(), LexError> {
    buffer.push(token).map_err(|_| LexError::TooManyTokens {
        processed: MAX_TOKENS + 1,
    })
}

fn map_incremental_error(error: IncrementalError) -> LexError {
    match error {
        IncrementalError::TokenOverflow => LexError::TooManyTokens {
            processed: MAX_TOKENS,
        },
        _ => LexError::Engine,
    }
}

/// Parse a REPL command from the provided line.
pub fn parse(line: &str) -> Result<Command<'_>, ParseError<'_>> {
    let tokens = lex(line).map_err(ParseError::Lex)?;

    if let Some(token) = tokens.iter().find(|token| token.kind == TokenKind::Error) {
        return Err(ParseError::Grammar(GrammarError::invalid_token(token)));
    }

    let mut input = tokens.as_slice();
    let command = match command().parse_next(&mut input) {
        Ok(command) => command,
        Err(ErrMode::Backtrack(err) | ErrMode::Cut(err)) => {
            return Err(ParseError::Grammar(err));
        }
        Err(ErrMode::Incomplete(_)) => {
            return Err(ParseError::Grammar(GrammarError::unexpected(
                "token",
                input.first(),
            )));
        }
    };

    match input.iter().find(|token| token.kind != TokenKind::Eol) {
        Some(token) => Err(ParseError::Grammar(GrammarError::unexpected(
            "end of command",
            Some(token),
        ))),
        None => Ok(command),
    }
}

fn command<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        let checkpoint = input.checkpoint();
        let keyword = expect_kind(TokenKind::Ident, "command keyword").parse_next(input)?;

        let Some(spec) = catalog::find(keyword.lexeme) else {
            input.reset(&checkpoint);
            return Err(ErrMode::Backtrack(GrammarError::unexpected(
                "command keyword",
                Some(&keyword),
            )));
        };

        match spec.tag {
            CommandTag::Run => run_args().parse_next(input),
            CommandTag::Tick => tick_args().parse_next(input),
            CommandTag::Advance => {
                let token = expect_kind(TokenKind::Duration, "duration").parse_next(input)?;
                let duration = parse_duration(&token).map_err(ErrMode::Cut)?;
                Ok(Command::Advance(duration))
            }
            CommandTag::Sensor => sensor_args().parse_next(input),
            CommandTag::Cancel => Ok(Command::Cancel),
            CommandTag::Arm => timer_arg().parse_next(input).map(Command::Arm),
            CommandTag::Disarm => timer_arg().parse_next(input).map(Command::Disarm),
            CommandTag::Status => Ok(Command::Status),
            CommandTag::Help => {
                let topic = optional_kind(TokenKind::Ident).parse_next(input)?;
                Ok(Command::Help(HelpCommand {
                    topic: topic.map(|token| token.lexeme),
                }))
            }
        }
    }
}

fn run_args<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        let token = expect_kind(TokenKind::Ident, "routine").parse_next(input)?;
        RoutineKind::from_tag(token.lexeme)
            .map(Command::Run)
            .ok_or_else(|| ErrMode::Cut(GrammarError::unknown_routine(&token)))
    }
}

fn tick_args<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        let count = match optional_kind(TokenKind::Integer).parse_next(input)? {
            Some(token) => parse_tick_count(&token).map_err(ErrMode::Cut)?,
            None => 1,
        };
        Ok(Command::Tick(count))
    }
}

fn sensor_args<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, Command<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| {
        let name = expect_kind(TokenKind::Ident, "sensor name").parse_next(input)?;
        let sensor =
            SensorId::from_name(name.lexeme).ok_or(ErrMode::Cut(GrammarError::unknown_sensor(&name)))?;

        let reading = match input.split_first() {
            Some((token, rest)) if token.kind == TokenKind::Integer => {
                let value = parse_integer(token).map_err(ErrMode::Cut)?;
                *input = rest;
                SensorOverride::Value(value)
            }
            Some((token, rest))
                if token.kind == TokenKind::Ident && token.lexeme.eq_ignore_ascii_case("off") =>
            {
                *input = rest;
                SensorOverride::Off
            }
            other => {
                return Err(ErrMode::Backtrack(GrammarError::unexpected(
                    "sensor value or `off`",
                    other.map(|(token, _)| token),
                )));
            }
        };

        Ok(Command::Sensor(SensorCommand { sensor, reading }))
    }
}

/// Timer index, either bare (`2`) or as shown by `status` (`t2`).
fn timer_arg<'src, 'slice>() -> impl Parser<Input<'src, 'slice>, TimerId, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == TokenKind::Integer => {
            let index = token
                .lexeme
                .parse::<u8>()
                .map_err(|_| ErrMode::Cut(GrammarError::invalid_integer(token)))?;
            *input = rest;
            Ok(TimerId(index))
        }
        Some((token, rest)) if token.kind == TokenKind::Ident => {
            let index = token
                .lexeme
                .strip_prefix(['t', 'T'])
                .and_then(|digits| digits.parse::<u8>().ok())
                .ok_or_else(|| ErrMode::Cut(GrammarError::unexpected("timer", Some(token))))?;
            *input = rest;
            Ok(TimerId(index))
        }
        other => Err(ErrMode::Backtrack(GrammarError::unexpected(
            "timer",
            other.map(|(token, _)| token),
        ))),
    }
}

fn expect_kind<'src, 'slice>(
    kind: TokenKind,
    label: &'static str,
) -> impl Parser<Input<'src, 'slice>, Token<'src>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == kind => {
            *input = rest;
            Ok(token.clone())
        }
        Some((token, _)) => Err(ErrMode::Backtrack(GrammarError::unexpected(
            label,
            Some(token),
        ))),
        None => Err(ErrMode::Backtrack(GrammarError::unexpected(label, None))),
    }
}

fn optional_kind<'src, 'slice>(
    kind: TokenKind,
) -> impl Parser<Input<'src, 'slice>, Option<Token<'src>>, GrammarError<'src>>
where
    'src: 'slice,
{
    move |input: &mut Input<'src, 'slice>| match input.split_first() {
        Some((token, rest)) if token.kind == kind => {
            *input = rest;
            Ok(Some(token.clone()))
        }
        _ => Ok(None),
    }
}

fn parse_integer<'a>(token: &Token<'a>) -> Result<i32, GrammarError<'a>> {
    token
        .lexeme
        .parse::<i32>()
        .map_err(|_| GrammarError::invalid_integer(token))
}

fn parse_tick_count<'a>(token: &Token<'a>) -> Result<u32, GrammarError<'a>> {
    match token.lexeme.parse::<u32>() {
        Ok(count) if (1..=MAX_TICK_COUNT).contains(&count) => Ok(count),
        _ => Err(GrammarError::invalid_integer(token)),
    }
}

fn parse_duration<'a>(token: &Token<'a>) -> Result<Duration, GrammarError<'a>> {
    let text = token.lexeme;
    if let Some(rest) = text.strip_suffix("ms") {
        let millis = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::invalid_duration(token))?;
        Ok(Duration::from_millis(millis.into()))
    } else if let Some(rest) = text.strip_suffix('s') {
        let seconds = rest
            .parse::<u32>()
            .map_err(|_| GrammarError::invalid_duration(token))?;
        Ok(Duration::from_secs(seconds.into()))
    } else {
        Err(GrammarError::invalid_duration(token))
    }
}
