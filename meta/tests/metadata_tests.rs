use std::io::{Cursor, Read};

use meta::{scan_with_replay, Format, Metadata, ProfileError};

fn minimal_profile(major: u8) -> Vec<u8> {
    let mut profile = vec![0; 132];
    profile[0..4].copy_from_slice(&132u32.to_be_bytes());
    profile[8] = major;
    profile[12..16].copy_from_slice(b"mntr");
    profile[16..20].copy_from_slice(b"RGB ");
    profile[20..24].copy_from_slice(b"XYZ ");
    profile[36..40].copy_from_slice(b"acsp");
    profile
}

#[test]
fn test_profile_is_parsed_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    let metadata =
        Metadata::new(Format::Jpeg, 640, 480, 8).with_icc_profile_data(minimal_profile(4));
    let first = metadata.icc_profile().unwrap().unwrap();
    let second = metadata.icc_profile().unwrap().unwrap();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.header().version().major, 4);
    assert_eq!(first.tag_signatures().count(), 0);
}

#[test]
fn test_profile_shared_across_threads() {
    let metadata = Metadata::new(Format::Png, 1, 1, 8).with_icc_profile_data(minimal_profile(2));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    metadata.icc_profile().unwrap().unwrap() as *const icc::Profile as usize
                })
            })
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    });
}

#[test]
fn test_malformed_profile_is_deferred() {
    let mut data = minimal_profile(4);
    data[36..40].copy_from_slice(b"bad!");
    let metadata = Metadata::new(Format::WebP, 1200, 1200, 8).with_icc_profile_data(data);

    assert_eq!(metadata.pixel_width(), 1200);
    match metadata.icc_profile() {
        Err(ProfileError::Profile(e)) => {
            assert_eq!(e.to_string(), "invalid profile file signature 'bad!'")
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_scan_with_replay() {
    let input = b"0123456789".to_vec();
    let (result, mut replay) = scan_with_replay(Cursor::new(input.clone()), |reader| {
        let mut prefix = [0; 4];
        reader.read_exact(&mut prefix).map(|_| prefix)
    });
    assert_eq!(&result.unwrap(), b"0123");

    let mut replayed = Vec::new();
    replay.read_to_end(&mut replayed).unwrap();
    assert_eq!(replayed, input);
}
