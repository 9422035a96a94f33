use bvh_kinematics::{
    load_bvh_from_file, load_bvh_from_reader, parse, parse_into, Bvh, BvhError, Channel, Index,
    ParserConfig, END_SITE,
};

const EXAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/example.bvh");

const SINGLE_JOINT: &str = "HIERARCHY
ROOT Pelvis
{
  OFFSET 1.0 2.0 3.0
  CHANNELS 3 Xposition Yposition Zposition
}
MOTION
Frames: 2
Frame Time: 0.0083333
1 2 3
4 5 6
";

const HIERARCHY_ONLY: &str = "HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 3 Xposition Yposition Zposition
  JOINT Spine
  {
    OFFSET 0 5 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0 1 0
    }
  }
}
";

#[test]
fn example_file() {
    let bvh = load_bvh_from_file(EXAMPLE).unwrap();
    let root = bvh.root_joint().unwrap();
    assert_eq!(root.name(), "Hips");
    assert_eq!(
        root.channel_data(),
        &[
            vec![8.03, 35.01, 88.36, -3.41, 14.78, -164.35],
            vec![7.81, 35.10, 86.47, -3.78, 12.94, -166.97],
        ]
    );
    assert_eq!(bvh.num_frames(), 2);
    assert_eq!(bvh.frame_time(), 0.033333);
    assert_eq!(bvh.fps(), 30);
    assert_eq!(bvh.num_channels(), 21);
    assert_eq!(
        root.channel_names(),
        vec!["XPOSITION", "YPOSITION", "ZPOSITION", "ZROTATION", "XROTATION", "YROTATION"]
    );
    let knee = bvh.joint_by_name("LeftKnee").unwrap();
    assert_eq!(knee.channel_value(1, 1), Some(0.0));
    assert_eq!(knee.frame_channel_data(0), Some(&[-10.21, 0.0, 4.69][..]));
    assert_eq!(knee.channel_value(2, 0), None);
}

#[test]
fn single_root_joint() {
    let bvh = parse(SINGLE_JOINT).unwrap();
    let root = bvh.root_joint().unwrap();
    assert_eq!(root.name(), "Pelvis");
    assert_eq!(root.offset(), bvh_kinematics::Position::new(1.0, 2.0, 3.0));
    assert!(root.children().is_empty());
    assert_eq!(root.parent(), None);
    assert_eq!(bvh.num_frames(), 2);
    assert_eq!(bvh.frame_time(), 0.0083333);
    assert_eq!(root.channel_data, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    // parse alone does not evaluate the pose
    assert!(root.transforms.is_empty());
    assert_eq!(root.position(0), None);
}

#[test]
fn channel_rows_match_channel_order() {
    let bvh = load_bvh_from_file(EXAMPLE).unwrap();
    for joint in bvh.joints() {
        assert_eq!(joint.channel_data().len(), bvh.num_frames());
        for row in joint.channel_data() {
            assert_eq!(row.len(), joint.channel_order().len(), "{}", joint.name());
        }
    }
}

#[test]
fn joint_list_is_preorder() {
    let bvh = load_bvh_from_file(EXAMPLE).unwrap();
    let names: Vec<&str> = bvh.joints().iter().map(|j| j.name()).collect();
    assert_eq!(
        names,
        vec!["Hips", "Chest", "Neck", "Head", END_SITE, "LeftHip", "LeftKnee", END_SITE]
    );

    let order: Vec<Index> = bvh.preorder(bvh.root.unwrap()).collect();
    let indices: Vec<Index> = bvh.joints().iter().map(|j| j.index).collect();
    assert_eq!(order, indices);

    let hips = bvh.root_joint().unwrap();
    assert_eq!(hips.children(), &[1, 5]);
    assert_eq!(bvh.joints[4].parent(), Some(3));
    assert!(bvh.joints[4].is_end_site());
    assert!(bvh.joints[7].channel_order().is_empty());
    assert_eq!(bvh.joints[7].channel_data(), &[Vec::<f64>::new(), Vec::new()]);
    assert_eq!(bvh.joints[6].depth, 2);
    assert_eq!(bvh.kinematic_chains(), vec![vec![0, 1, 2, 3, 4], vec![5, 6, 7]]);
}

#[test]
fn missing_motion_keyword() {
    for source in [HIERARCHY_ONLY.to_string(), format!("{}MOTON\n", HIERARCHY_ONLY)] {
        let mut bvh = Bvh::new();
        let err = parse_into(&source, &mut bvh, &ParserConfig::default()).unwrap_err();
        match err {
            BvhError::Structural { ref expected, .. } => assert_eq!(expected, "MOTION"),
            other => panic!("expected a structural error, got {other:?}"),
        }
        assert_eq!(bvh.joints().len(), 3);
        assert!(bvh.joints().iter().all(|j| j.channel_data().is_empty()));
    }
}

#[test]
fn unknown_channel_stops_parsing() {
    let source = "HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 3 Xposition Yposition Zposition
  JOINT Spine
  {
    OFFSET 0 5 0
    CHANNELS 3 Zrotation Wrotation Yrotation
  }
}
MOTION
Frames: 0
Frame Time: 0.1
";
    let mut bvh = Bvh::new();
    let err = parse_into(source, &mut bvh, &ParserConfig::default()).unwrap_err();
    match err {
        BvhError::UnknownChannel { joint, found, line } => {
            assert_eq!(joint, "Spine");
            assert_eq!(found, "Wrotation");
            assert_eq!(line, 9);
        }
        other => panic!("expected an unknown channel error, got {other:?}"),
    }
    // joints parsed before the bad token stay, the offending one never made it in
    assert_eq!(bvh.joints().len(), 1);
    assert_eq!(
        bvh.joints[0].channel_order(),
        &[Channel::XPosition, Channel::YPosition, Channel::ZPosition]
    );
}

#[test]
fn non_numeric_offset() {
    let source = "HIERARCHY\nROOT Hips\n{\n  OFFSET 0 abc 0\n";
    let err = parse(source).unwrap_err();
    match err {
        BvhError::Token {
            expected,
            found,
            line,
        } => {
            assert_eq!(expected, "offset y");
            assert_eq!(found, "abc");
            assert_eq!(line, 4);
        }
        other => panic!("expected a token error, got {other:?}"),
    }
    assert!(parse("HIERARCHY ROOT A { OFFSET 0 0 0 CHANNELS x").is_err());
}

#[test]
fn non_finite_numbers() {
    for bad in ["NaN", "nan", "inf", "-infinity"] {
        let source = format!("HIERARCHY ROOT Hips {{ OFFSET 0 {} 0 CHANNELS 0 }}", bad);
        match parse(&source) {
            Err(BvhError::Token { found, .. }) => assert_eq!(found, bad),
            other => panic!("expected a token error for {bad}, got {other:?}"),
        }
    }

    let frame_time = SINGLE_JOINT.replace("0.0083333", "inf");
    assert!(matches!(
        parse(&frame_time),
        Err(BvhError::Token { ref expected, .. }) if expected == "frame time"
    ));
    let motion = SINGLE_JOINT.replace("4 5 6", "4 NaN 6");
    assert!(matches!(
        parse(&motion),
        Err(BvhError::Token { ref found, line: 11, .. }) if found == "NaN"
    ));
}

#[test]
fn truncated_joint() {
    let source = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 0 JOINT Spine { OFFSET 0 1 0";
    assert!(matches!(parse(source), Err(BvhError::UnexpectedEof { .. })));
    let source = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 0";
    assert!(matches!(parse(source), Err(BvhError::UnexpectedEof { .. })));
}

#[test]
fn truncated_motion() {
    let source = SINGLE_JOINT.trim_end().trim_end_matches("4 5 6").to_string() + "4 5";
    let mut bvh = Bvh::new();
    let err = parse_into(&source, &mut bvh, &ParserConfig::default()).unwrap_err();
    assert!(matches!(err, BvhError::UnexpectedEof { .. }));
    // the frame count is checked against the data before any row is stored
    assert!(bvh.joints[0].channel_data.is_empty());
    assert_eq!(bvh.joints[0].channel_order().len(), 3);
}

#[test]
fn trailing_data_is_rejected() {
    let source = format!("{}7 8 9\n", SINGLE_JOINT);
    assert!(matches!(
        parse(&source),
        Err(BvhError::Structural { ref found, line: 12, .. }) if found == "7"
    ));
}

#[test]
fn end_without_site() {
    let source = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 0 End { OFFSET 0 1 0 } }";
    assert!(matches!(
        parse(source),
        Err(BvhError::Structural { ref expected, ref found, .. }) if expected == "Site" && found == "{"
    ));
}

#[test]
fn unexpected_token_in_joint_body() {
    let source = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 0 BONE Spine { } }";
    let err = parse(source).unwrap_err();
    assert!(err.is_parse_error());
    assert!(matches!(err, BvhError::Structural { ref found, .. } if found == "BONE"));
}

#[test]
fn file_must_start_with_hierarchy() {
    let err = parse(&SINGLE_JOINT.replace("HIERARCHY", "HIERARCHIES")).unwrap_err();
    assert!(matches!(err, BvhError::Structural { ref expected, line: 1, .. } if expected == "HIERARCHY"));
    let err = parse(&SINGLE_JOINT.replace("ROOT", "JOINT")).unwrap_err();
    assert!(matches!(err, BvhError::Structural { ref expected, line: 2, .. } if expected == "ROOT"));
}

#[test]
fn io_errors() {
    let err = load_bvh_from_file("does/not/exist.bvh").unwrap_err();
    assert!(matches!(err, BvhError::Io(_)));
    assert!(!err.is_parse_error());
}

#[test]
fn load_from_reader() {
    let bvh = load_bvh_from_reader(SINGLE_JOINT.as_bytes()).unwrap();
    assert_eq!(bvh.root_joint().unwrap().name(), "Pelvis");
    assert_eq!(bvh.root_joint().unwrap().transforms.len(), 2);
}
