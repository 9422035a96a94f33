use crate::error::{BvhError, Result};
use crate::kinematics::recalculate_transforms;
use crate::types::*;
use regex::{Matches, Regex};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, error, info, trace};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("token pattern"));

const HIERARCHY: &str = "HIERARCHY";
const ROOT: &str = "ROOT";
const JOINT: &str = "JOINT";
const END: &str = "End";
const SITE: &str = "Site";
const OFFSET: &str = "OFFSET";
const CHANNELS: &str = "CHANNELS";
const MOTION: &str = "MOTION";
const FRAMES: &str = "Frames:";
const FRAME: &str = "Frame";
const TIME: &str = "Time:";

/// Knobs for the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest JOINT nesting accepted before the file is rejected.
    pub max_depth: usize,
    /// Largest `Frames:` count accepted.
    pub max_frames: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_depth: 256,
            max_frames: 1_000_000,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

/// Whitespace-delimited tokens, tagged with the (1-based) line they start on.
struct Tokens<'a> {
    source: &'a str,
    matches: Matches<'static, 'a>,
    line: usize,
    scanned: usize,
    consumed: usize,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Tokens {
            source,
            matches: TOKEN.find_iter(source),
            line: 1,
            scanned: 0,
            consumed: 0,
        }
    }

    /// Number of tokens not yet handed out.
    fn remaining(&self) -> usize {
        TOKEN.find_iter(&self.source[self.consumed..]).count()
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let m = self.matches.next()?;
        self.line += self.source[self.scanned..m.start()]
            .bytes()
            .filter(|&b| b == b'\n')
            .count();
        self.scanned = m.start();
        self.consumed = m.end();
        Some(Token {
            text: m.as_str(),
            line: self.line,
        })
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

struct Parser<'a, 'b> {
    tokens: Tokens<'a>,
    bvh: &'b mut Bvh,
    config: &'b ParserConfig,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn next_token(&mut self, expected: &str) -> Result<Token<'a>> {
        self.tokens.next().ok_or_else(|| BvhError::UnexpectedEof {
            expected: expected.to_string(),
        })
    }

    /// Keywords that open the file or one of its sections. Running out of input here is a
    /// structural problem rather than a truncated joint or motion block.
    fn expect_section(&mut self, keyword: &str) -> Result<()> {
        match self.tokens.next() {
            Some(token) if token.text == keyword => Ok(()),
            Some(token) => Err(structural(keyword, token)),
            None => Err(BvhError::Structural {
                expected: keyword.to_string(),
                found: "end of file".to_string(),
                line: self.tokens.line,
            }),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_token(keyword)?;
        if token.text == keyword {
            Ok(())
        } else {
            Err(structural(keyword, token))
        }
    }

    fn parse_f64(&mut self, expected: &str) -> Result<f64> {
        let token = self.next_token(expected)?;
        match token.text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(BvhError::Token {
                expected: expected.to_string(),
                found: token.text.to_string(),
                line: token.line,
            }),
        }
    }

    fn parse_usize(&mut self, expected: &str) -> Result<usize> {
        let token = self.next_token(expected)?;
        token.text.parse::<usize>().map_err(|_| BvhError::Token {
            expected: expected.to_string(),
            found: token.text.to_string(),
            line: token.line,
        })
    }

    fn parse_offset(&mut self) -> Result<Position> {
        self.expect_keyword(OFFSET)?;
        let x = self.parse_f64("offset x")?;
        let y = self.parse_f64("offset y")?;
        let z = self.parse_f64("offset z")?;
        trace!("Offset x: {}, y: {}, z: {}", x, y, z);
        Ok(Position::new(x, y, z))
    }

    fn parse_hierarchy(&mut self) -> Result<()> {
        info!("Parsing hierarchy");
        self.expect_section(ROOT)?;
        let root = self.parse_joint(None, 0)?;
        self.bvh.root = Some(root);
        self.expect_section(MOTION)?;
        self.parse_motion()
    }

    /// Parses a joint and its whole subtree. The ROOT/JOINT keyword has already been consumed.
    fn parse_joint(&mut self, parent: Option<Index>, depth: Depth) -> Result<Index> {
        let name = self.next_token("joint name")?;
        if depth > self.config.max_depth {
            return Err(BvhError::Structural {
                expected: format!("at most {} nested joints", self.config.max_depth),
                found: name.text.to_string(),
                line: name.line,
            });
        }
        debug!("Joint name : {}", name.text);

        self.expect_keyword("{")?;
        let offset = self.parse_offset()?;
        self.expect_keyword(CHANNELS)?;
        let channel_order = self.parse_channel_order(name.text)?;

        let mut joint = Joint::new(name.text, offset, parent, depth);
        joint.channel_order = channel_order;
        let index = self.bvh.add_joint(joint);

        let mut children = Vec::new();
        loop {
            let token = self.next_token("JOINT, End Site or \"}\"")?;
            match token.text {
                JOINT => children.push(self.parse_joint(Some(index), depth + 1)?),
                END => children.push(self.parse_end_site(index, depth + 1)?),
                "}" => {
                    self.bvh.joints[index].children = children;
                    return Ok(index);
                }
                other if Channel::from_literal(other).is_some() => {
                    return Err(BvhError::ChannelCountMismatch {
                        joint: name.text.to_string(),
                        declared: self.bvh.joints[index].channel_order.len(),
                        line: token.line,
                    });
                }
                _ => return Err(structural("JOINT, End Site or \"}\"", token)),
            }
        }
    }

    /// The `End` keyword has already been consumed.
    fn parse_end_site(&mut self, parent: Index, depth: Depth) -> Result<Index> {
        self.expect_keyword(SITE)?;
        self.expect_keyword("{")?;
        let offset = self.parse_offset()?;
        self.expect_keyword("}")?;
        debug!("Joint name : {}", END_SITE);
        Ok(self
            .bvh
            .add_joint(Joint::new(END_SITE, offset, Some(parent), depth)))
    }

    fn parse_channel_order(&mut self, joint_name: &str) -> Result<Vec<Channel>> {
        let num = self.parse_usize("channel count")?;
        trace!("Number of channels : {}", num);
        let mut channels = Vec::new();
        for _ in 0..num {
            let token = self.next_token("channel name")?;
            if matches!(token.text, JOINT | END | "}") {
                return Err(BvhError::ChannelCountMismatch {
                    joint: joint_name.to_string(),
                    declared: num,
                    line: token.line,
                });
            }
            let channel =
                Channel::from_literal(token.text).ok_or_else(|| BvhError::UnknownChannel {
                    joint: joint_name.to_string(),
                    found: token.text.to_string(),
                    line: token.line,
                })?;
            channels.push(channel);
        }
        Ok(channels)
    }

    fn parse_motion(&mut self) -> Result<()> {
        info!("Parsing motion");
        self.expect_keyword(FRAMES)?;
        let num_frames = self.parse_usize("frame count")?;
        self.expect_keyword(FRAME)?;
        self.expect_keyword(TIME)?;
        let frame_time = self.parse_f64("frame time")?;
        debug!("Num of frames : {}, frame time : {}", num_frames, frame_time);
        if num_frames > self.config.max_frames {
            return Err(BvhError::Structural {
                expected: format!("at most {} frames", self.config.max_frames),
                found: num_frames.to_string(),
                line: self.tokens.line,
            });
        }
        let required = num_frames.checked_mul(self.bvh.num_channels);
        if required.map_or(true, |required| required > self.tokens.remaining()) {
            return Err(BvhError::UnexpectedEof {
                expected: format!(
                    "{} frames of {} motion values",
                    num_frames, self.bvh.num_channels
                ),
            });
        }
        self.bvh.num_frames = num_frames;
        self.bvh.frame_time = frame_time;

        for _ in 0..num_frames {
            for i in 0..self.bvh.joints.len() {
                let num_channels = self.bvh.joints[i].channel_order.len();
                let mut row = Vec::with_capacity(num_channels);
                for _ in 0..num_channels {
                    row.push(self.parse_f64("motion data")?);
                }
                self.bvh.joints[i].channel_data.push(row);
            }
        }

        match self.tokens.next() {
            Some(token) => Err(structural("end of file after motion data", token)),
            None => Ok(()),
        }
    }
}

fn structural(expected: &str, found: Token) -> BvhError {
    BvhError::Structural {
        expected: expected.to_string(),
        found: found.text.to_string(),
        line: found.line,
    }
}

//////////////////////////////////////////////////////////////// PUBLIC ////////////////////////////////////////////////////////////////

/// Parse bvh text into `bvh`, replacing whatever it held.
///
/// Parsing stops at the first error. Whatever was read up to that point is left in `bvh`,
/// so callers can inspect how far the file got.
pub fn parse_into(source: &str, bvh: &mut Bvh, config: &ParserConfig) -> Result<()> {
    *bvh = Bvh::new();
    let mut parser = Parser {
        tokens: Tokens::new(source),
        bvh,
        config,
    };
    let result = parser
        .expect_section(HIERARCHY)
        .and_then(|_| parser.parse_hierarchy());
    match &result {
        Ok(()) => info!("Successfully parsed file"),
        Err(err) => error!("{}", err),
    }
    result
}

pub fn parse_with_config(source: &str, config: &ParserConfig) -> Result<Bvh> {
    let mut bvh = Bvh::new();
    parse_into(source, &mut bvh, config)?;
    Ok(bvh)
}

/// Parse bvh text. Transforms are not computed, see [`load_bvh_from_string`] for that.
pub fn parse(source: &str) -> Result<Bvh> {
    parse_with_config(source, &ParserConfig::default())
}

/// load a bvh file from a string and compute the pose of every frame
pub fn load_bvh_from_string(bvh_string: &str) -> Result<Bvh> {
    let mut bvh = parse(bvh_string)?;
    recalculate_transforms(&mut bvh, None)?;
    Ok(bvh)
}

/// load a bvh file from any reader and compute the pose of every frame
pub fn load_bvh_from_reader<R: Read>(mut reader: R) -> Result<Bvh> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    load_bvh_from_string(&contents)
}

/// load a bvh file from a file path and compute the pose of every frame
pub fn load_bvh_from_file<P: AsRef<Path>>(file_path: P) -> Result<Bvh> {
    let file_path = file_path.as_ref();
    info!("Parsing file : {}", file_path.display());
    let file = File::open(file_path)?;
    load_bvh_from_reader(BufReader::new(file))
}
