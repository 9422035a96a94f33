use crate::error::{BvhError, Result};
use crate::types::{Bvh, Channel, Index, Joint, Matrix};
use crate::utils::{axis_translation, rotation_matrix, translation_of};
use tracing::{debug, trace};

fn channel_matrix(channel: Channel, value: f64) -> Matrix {
    if channel.is_position() {
        axis_translation(value, channel.axis())
    } else {
        rotation_matrix(value, channel.axis())
    }
}

impl Joint {
    /// Local transform of the joint at `frame`: the offset translation, right-multiplied by
    /// every channel operation starting from the last declared channel.
    pub fn local_transform(&self, frame: usize) -> Result<Matrix> {
        let row = self
            .channel_data
            .get(frame)
            .ok_or_else(|| BvhError::MissingFrames {
                joint: self.name.clone(),
                expected: frame + 1,
                found: self.channel_data.len(),
            })?;
        if row.len() != self.channel_order.len() {
            return Err(BvhError::ChannelDataMismatch {
                joint: self.name.clone(),
                frame,
                expected: self.channel_order.len(),
                found: row.len(),
            });
        }

        let mut local = Matrix::from_translation(self.offset);
        for (&channel, &value) in self.channel_order.iter().zip(row.iter()).rev() {
            local = local * channel_matrix(channel, value);
        }
        Ok(local)
    }

    fn check_channel_data(&self, num_frames: usize) -> Result<()> {
        if self.channel_data.len() < num_frames {
            return Err(BvhError::MissingFrames {
                joint: self.name.clone(),
                expected: num_frames,
                found: self.channel_data.len(),
            });
        }
        let expected = self.channel_order.len();
        match self.channel_data[..num_frames]
            .iter()
            .position(|row| row.len() != expected)
        {
            Some(frame) => Err(BvhError::ChannelDataMismatch {
                joint: self.name.clone(),
                frame,
                expected,
                found: self.channel_data[frame].len(),
            }),
            None => Ok(()),
        }
    }
}

/// Forward kinematics: computes the world transform and position of every joint in the
/// subtree of `start` (the root when `None`) for every frame.
///
/// Joints are visited in pre-order, so a joint always sees its parent's transforms of the
/// same pass. Earlier results are replaced. When starting below the root, the start joint's
/// parent must already hold transforms for all frames.
pub fn recalculate_transforms(bvh: &mut Bvh, start: Option<Index>) -> Result<()> {
    let Some(start) = start.or(bvh.root) else {
        return Ok(());
    };
    if start >= bvh.joints.len() {
        return Err(BvhError::InvalidJoint(start));
    }
    let num_frames = bvh.num_frames;
    let order: Vec<Index> = bvh.preorder(start).collect();

    for index in order {
        let joint = bvh.joints.get(index).ok_or(BvhError::InvalidJoint(index))?;
        debug!("recalculate_transforms: {}", joint.name);
        joint.check_channel_data(num_frames)?;

        let parent = match joint.parent {
            Some(parent_index) => {
                let parent = bvh
                    .joints
                    .get(parent_index)
                    .ok_or(BvhError::InvalidJoint(parent_index))?;
                if parent.transforms.len() < num_frames {
                    return Err(BvhError::ParentNotEvaluated {
                        joint: joint.name.clone(),
                        parent: parent.name.clone(),
                    });
                }
                Some(parent)
            }
            None => None,
        };

        let mut transforms = Vec::with_capacity(num_frames);
        let mut positions = Vec::with_capacity(num_frames);
        for frame in 0..num_frames {
            let local = joint.local_transform(frame)?;
            let world = match parent {
                Some(parent) => parent.transforms[frame] * local,
                None => local,
            };
            let position = translation_of(&world);
            trace!("Joint world position: {:?}", position);
            transforms.push(world);
            positions.push(position);
        }

        let joint = &mut bvh.joints[index];
        joint.transforms = transforms;
        joint.positions = positions;
    }
    Ok(())
}
