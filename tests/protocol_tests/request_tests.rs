//! Request/Response Tests
//!
//! Validation of request frames and response shapes.

use chrono::NaiveDate;
use fileport::protocol::{CommandType, Request, RequestFrame, Response, Status};
use fileport::{FileMetadata, FilePortError, ProtocolError};

fn frame(command: &str, filename: Option<&str>) -> RequestFrame {
    RequestFrame {
        command: command.to_string(),
        filename: filename.map(str::to_string),
    }
}

// =============================================================================
// Request Validation Tests
// =============================================================================

#[test]
fn test_commands_without_filename() {
    assert_eq!(Request::try_from(frame("LIST", None)), Ok(Request::List));
    assert_eq!(Request::try_from(frame("QUIT", None)), Ok(Request::Quit));
}

#[test]
fn test_filename_ignored_for_list() {
    assert_eq!(Request::try_from(frame("LIST", Some("x"))), Ok(Request::List));
}

#[test]
fn test_commands_with_filename() {
    assert_eq!(
        Request::try_from(frame("UPLOAD", Some("a.txt"))),
        Ok(Request::Upload {
            filename: "a.txt".to_string()
        })
    );
    assert_eq!(
        Request::try_from(frame("DOWNLOAD", Some("a.txt"))),
        Ok(Request::Download {
            filename: "a.txt".to_string()
        })
    );
    assert_eq!(
        Request::try_from(frame("DELETE", Some("a.txt"))),
        Ok(Request::Delete {
            filename: "a.txt".to_string()
        })
    );
}

#[test]
fn test_missing_and_empty_filename() {
    for command in ["UPLOAD", "DOWNLOAD", "DELETE"] {
        assert_eq!(
            Request::try_from(frame(command, None)),
            Err(ProtocolError::MissingFilename),
            "{} without filename",
            command
        );
        assert_eq!(
            Request::try_from(frame(command, Some(""))),
            Err(ProtocolError::MissingFilename),
            "{} with empty filename",
            command
        );
    }
}

#[test]
fn test_unknown_command() {
    let err = Request::try_from(frame("FOO", None)).unwrap_err();

    assert_eq!(err, ProtocolError::UnknownCommand("FOO".to_string()));
    assert_eq!(err.to_string(), "Unknown command: FOO");
}

#[test]
fn test_command_names_are_case_sensitive() {
    assert_eq!(
        Request::try_from(frame("list", None)),
        Err(ProtocolError::UnknownCommand("list".to_string()))
    );
}

#[test]
fn test_unknown_command_checked_before_filename() {
    assert_eq!(
        Request::try_from(frame("", None)),
        Err(ProtocolError::UnknownCommand(String::new()))
    );
}

#[test]
fn test_request_to_frame() {
    let request = Request::Download {
        filename: "movie.mkv".to_string(),
    };
    let frame = RequestFrame::from(&request);

    assert_eq!(frame.command, "DOWNLOAD");
    assert_eq!(frame.filename.as_deref(), Some("movie.mkv"));
    assert_eq!(RequestFrame::from(&Request::Quit).filename, None);
}

#[test]
fn test_command_type_names() {
    for command in [
        CommandType::List,
        CommandType::Upload,
        CommandType::Download,
        CommandType::Delete,
        CommandType::Quit,
    ] {
        assert_eq!(CommandType::parse(command.as_str()), Some(command));
    }
    assert_eq!(CommandType::parse("PING"), None);
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_response_constructors() {
    let stored = Response::stored("a.txt", 5);
    assert_eq!(stored.status, Status::Success);
    assert_eq!(stored.message.as_deref(), Some("File a.txt stored successfully"));
    assert_eq!(stored.size, Some(5));

    let deleted = Response::deleted("a.txt");
    assert_eq!(deleted.message.as_deref(), Some("File a.txt deleted successfully"));
    assert_eq!(deleted.size, None);

    assert_eq!(Response::goodbye().message.as_deref(), Some("Goodbye!"));
    assert!(!Response::error("x").is_success());
}

#[test]
fn test_error_response_into_result() {
    let err = Response::error("File gone.txt not found")
        .into_result()
        .unwrap_err();

    match err {
        FilePortError::Remote(message) => assert_eq!(message, "File gone.txt not found"),
        other => panic!("Expected Remote error, got {:?}", other),
    }
}

#[test]
fn test_listing_serializes_metadata() {
    let modified = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(14, 5, 7)
        .unwrap();
    let response = Response::listing(vec![FileMetadata {
        name: "notes.md".to_string(),
        size: 42,
        modified,
        exists: true,
    }]);

    let text = serde_json::to_string(&response).unwrap();
    assert_eq!(
        text,
        r#"{"status":"success","files":[{"name":"notes.md","size":42,"modified":"2024-03-09 14:05:07","exists":true}]}"#
    );

    let back: Response = serde_json::from_str(&text).unwrap();
    assert_eq!(back, response);
}

#[test]
fn test_bad_timestamp_rejected() {
    let text = r#"{"name":"a","size":1,"modified":"yesterday","exists":true}"#;
    assert!(serde_json::from_str::<FileMetadata>(text).is_err());
}
