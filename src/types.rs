use cgmath::{Matrix3, Matrix4, Quaternion as CgQuaternion, Vector3};
use std::fmt;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Depth = usize;
pub type Position = Vector3<f64>;
pub type Quaternion = CgQuaternion<f64>;
pub type Matrix = Matrix4<f64>;

/// Name given to every synthetic leaf joint created from an `End Site` block.
pub const END_SITE: &str = "End Site";

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// A single motion channel of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    XPosition,
    YPosition,
    ZPosition,
    XRotation,
    YRotation,
    ZRotation,
}

impl Channel {
    /// Parse a channel from its literal in the file ("Xposition", "Zrotation" ...). Case sensitive.
    pub fn from_literal(literal: &str) -> Option<Channel> {
        match literal {
            "Xposition" => Some(Channel::XPosition),
            "Yposition" => Some(Channel::YPosition),
            "Zposition" => Some(Channel::ZPosition),
            "Xrotation" => Some(Channel::XRotation),
            "Yrotation" => Some(Channel::YRotation),
            "Zrotation" => Some(Channel::ZRotation),
            _ => None,
        }
    }

    pub fn literal(self) -> &'static str {
        match self {
            Channel::XPosition => "Xposition",
            Channel::YPosition => "Yposition",
            Channel::ZPosition => "Zposition",
            Channel::XRotation => "Xrotation",
            Channel::YRotation => "Yrotation",
            Channel::ZRotation => "Zrotation",
        }
    }

    /// Upper case display name, e.g. "XPOSITION".
    pub fn name(self) -> &'static str {
        match self {
            Channel::XPosition => "XPOSITION",
            Channel::YPosition => "YPOSITION",
            Channel::ZPosition => "ZPOSITION",
            Channel::XRotation => "XROTATION",
            Channel::YRotation => "YROTATION",
            Channel::ZRotation => "ZROTATION",
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Channel::XPosition | Channel::XRotation => Axis::X,
            Channel::YPosition | Channel::YRotation => Axis::Y,
            Channel::ZPosition | Channel::ZRotation => Axis::Z,
        }
    }

    pub fn is_position(self) -> bool {
        matches!(
            self,
            Channel::XPosition | Channel::YPosition | Channel::ZPosition
        )
    }

    pub fn is_rotation(self) -> bool {
        !self.is_position()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub index: Index,
    pub depth: Depth,
    /// Static translation from the parent joint.
    pub offset: Position,
    pub channel_order: Vec<Channel>,
    pub parent: Option<Index>,
    pub children: Vec<Index>,
    /// One row per frame, one value per entry of `channel_order`.
    pub channel_data: Vec<Vec<f64>>,

    // filled in by `recalculate_transforms`
    pub transforms: Vec<Matrix>,
    pub positions: Vec<Position>,
}

impl Joint {
    pub fn new(name: impl Into<String>, offset: Position, parent: Option<Index>, depth: Depth) -> Self {
        Joint {
            name: name.into(),
            index: 0,
            depth,
            offset,
            channel_order: Vec::new(),
            parent,
            children: Vec::new(),
            channel_data: Vec::new(),
            transforms: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    pub fn channel_order(&self) -> &[Channel] {
        &self.channel_order
    }

    pub fn num_channels(&self) -> usize {
        self.channel_order.len()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channel_order.iter().map(|c| c.name()).collect()
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn is_end_site(&self) -> bool {
        self.name == END_SITE && self.channel_order.is_empty() && self.children.is_empty()
    }

    pub fn channel_data(&self) -> &[Vec<f64>] {
        &self.channel_data
    }

    pub fn frame_channel_data(&self, frame: usize) -> Option<&[f64]> {
        self.channel_data.get(frame).map(Vec::as_slice)
    }

    pub fn channel_value(&self, frame: usize, channel: usize) -> Option<f64> {
        self.channel_data.get(frame)?.get(channel).copied()
    }

    /// World transform at `frame`. Only available after forward kinematics ran.
    pub fn transform(&self, frame: usize) -> Option<&Matrix> {
        self.transforms.get(frame)
    }

    /// World position at `frame`. Only available after forward kinematics ran.
    pub fn position(&self, frame: usize) -> Option<Position> {
        self.positions.get(frame).copied()
    }

    /// World rotation at `frame`, extracted from the transform's upper 3x3 block.
    pub fn rotation(&self, frame: usize) -> Option<Quaternion> {
        let m = self.transforms.get(frame)?;
        let rot = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
        Some(Quaternion::from(rot))
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// A parsed .bvh file: the joint hierarchy together with its motion.
///
/// Joints live in a flat arena in the order they were parsed, which is also the
/// order of their columns in the MOTION section. Parent and child links are
/// arena indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bvh {
    pub joints: Vec<Joint>,
    pub root: Option<Index>,
    pub num_frames: usize,
    pub frame_time: f64,
    pub num_channels: usize,
}

impl Bvh {
    pub fn new() -> Self {
        Bvh::default()
    }

    /// Append a joint to the arena and return its index.
    pub fn add_joint(&mut self, mut joint: Joint) -> Index {
        let index = self.joints.len();
        joint.index = index;
        self.num_channels += joint.channel_order.len();
        self.joints.push(joint);
        index
    }

    pub fn root_joint(&self) -> Option<&Joint> {
        self.root.and_then(|i| self.joints.get(i))
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: Index) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// First joint with the given name, in parse order.
    pub fn joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Frames per second, 0 when the frame time is not positive.
    pub fn fps(&self) -> u32 {
        if self.frame_time > 0.0 {
            (1.0 / self.frame_time).round() as u32
        } else {
            0
        }
    }

    /// Depth-first pre-order walk over the subtree rooted at `start`.
    pub fn preorder(&self, start: Index) -> Preorder<'_> {
        let stack = if start < self.joints.len() {
            vec![start]
        } else {
            Vec::new()
        };
        Preorder { bvh: self, stack }
    }

    /// Returns the kinematic chains of a bvh like \[\[0,1,2,3\],\[4,5,6,7,8\],\[9,10,11\]\].
    /// A new chain starts whenever a joint is not the child of the joint parsed right before it.
    pub fn kinematic_chains(&self) -> Vec<Vec<Index>> {
        let mut kinematic_chains: Vec<Vec<Index>> = Vec::new();
        let mut chain: Vec<Index> = Vec::new();
        for joint in self.joints.iter() {
            let continues = match (joint.parent, chain.last()) {
                (Some(parent), Some(&last)) => parent == last,
                _ => false,
            };
            if !continues && !chain.is_empty() {
                kinematic_chains.push(std::mem::take(&mut chain));
            }
            chain.push(joint.index);
        }
        if !chain.is_empty() {
            kinematic_chains.push(chain);
        }
        kinematic_chains
    }

    /// Global rest pose position of every joint (offsets summed along the ancestor path).
    pub fn rest_positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = Vec::with_capacity(self.joints.len());
        for joint in self.joints.iter() {
            let position = match joint.parent {
                // parents are always parsed before their children
                Some(parent) => positions[parent] + joint.offset,
                None => joint.offset,
            };
            positions.push(position);
        }
        positions
    }
}

pub struct Preorder<'a> {
    bvh: &'a Bvh,
    stack: Vec<Index>,
}

impl Iterator for Preorder<'_> {
    type Item = Index;

    fn next(&mut self) -> Option<Index> {
        let index = self.stack.pop()?;
        if let Some(joint) = self.bvh.joints.get(index) {
            self.stack.extend(joint.children.iter().rev().copied());
        }
        Some(index)
    }
}
