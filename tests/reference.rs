use walkdir::WalkDir;

/// Test decoding of all images in `tests/images/` against reference PNG files.
///
/// If a reference PNG file for an image does not exist or does not match,
/// it will be created/overwritten with the newly decoded image.
///
/// To add new test images, simply place them under `tests/images/xwd/`
/// and run `cargo test`. Files named `*.bad.xwd` must fail to decode.
#[test]
fn test_decoding() {
    image_xwd::register();

    let mut errors = vec![];

    for entry in WalkDir::new("tests/images") {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() || entry.path().extension().unwrap() == "png" {
            continue;
        }

        let mut add_error = |e: &str| {
            errors.push(format!("{}: {}", entry.path().display(), e));
        };

        let expect_failure = entry
            .path()
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().ends_with(".bad"));

        let img = match image::open(entry.path()) {
            Ok(_) if expect_failure => {
                add_error("Decoded an image that should be rejected");
                continue;
            }
            Ok(i) => i,
            Err(_) if expect_failure => continue,
            Err(e) => {
                add_error(&format!("Cannot decode image: {e}"));
                continue;
            }
        };

        let ref_path = entry.path().with_extension("png");

        let save_reference = || {
            _ = img.save(&ref_path); // save and ignore errors
        };

        if !ref_path.exists() {
            add_error("No reference PNG file found");
            save_reference();
            continue;
        }

        let reference = image::open(&ref_path).unwrap();

        if img != reference {
            add_error("Does not match reference");
            save_reference();
        }
    }

    if !errors.is_empty() {
        panic!("Decoding errors:\n{}", errors.join("\n"));
    }
}
