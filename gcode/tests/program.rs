use gcode::{Parser, Value};

#[test]
fn lines_keep_numbers_and_spans() {
    let source = "G1 X1\n\nN2 G0 Y2\r\n";
    let program = Parser::new(source.to_string(), 0).parse().expect("parse failed");

    assert_eq!(program.lines.len(), 3);
    assert_eq!(program.block_count(), 2);

    let blank = &program.lines[1];
    assert_eq!(blank.number, 2);
    assert!(blank.block.is_none());

    let last = &program.lines[2];
    assert_eq!(last.number, 3);
    assert_eq!(last.text, "N2 G0 Y2");
    assert_eq!(last.span, 7..15);
    assert_eq!(&source[last.span.clone()], "N2 G0 Y2");
    assert_eq!(last.block.as_ref().unwrap().line_number, 2);
}

#[test]
fn last_line_without_newline() {
    let program = Parser::new("G0\nM2".to_string(), 0).parse().unwrap();
    assert_eq!(program.lines.len(), 2);
    let m2 = program.lines[1].block.as_ref().unwrap();
    assert_eq!(m2.words[0].value(), Value::Integer(2));
}

#[test]
fn empty_source() {
    let program = Parser::new(String::new(), 0).parse().unwrap();
    assert!(program.lines.is_empty());
    assert_eq!(program.normalized(), "");
}

#[test]
fn every_malformed_line_is_reported() {
    let source = "G1\nG1 X\nM3\nY\n";
    let errors = Parser::new(source.to_string(), 4).parse().unwrap_err();

    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].line, 2);
    assert_eq!(errors[0].span, 6..7);
    assert_eq!(&source[errors[0].span.clone()], "X");
    assert_eq!(errors[0].file_id, 4);

    assert_eq!(errors[1].line, 4);
    assert_eq!(errors[1].span, 11..12);
    assert_eq!(errors[1].message, "word `Y` has no value");
}

#[test]
fn lossy_parse_keeps_good_lines() {
    let source = "G1\nG1 XABC\nM3\n";
    let (program, errors) = Parser::new(source.to_string(), 0).parse_lossy();
    assert_eq!(errors.len(), 1);
    assert_eq!(program.block_count(), 2);
    let texts: Vec<&str> = program.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["G1", "M3"]);
}

#[test]
fn normalized_output() {
    let program = Parser::new("g1 x1.0\n\n  N7   M3\n".to_string(), 0)
        .parse()
        .unwrap();
    assert_eq!(program.normalized(), "g1 x1\nN7 M3\n");
}

#[test]
fn diagnostics_point_at_the_word() {
    let errors = Parser::new("G0\nG1 XABC\n".to_string(), 1).parse().unwrap_err();
    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.message, "word `X` is not followed by a number");
    assert_eq!(diagnostic.labels[0].file_id, 1);
    assert_eq!(diagnostic.labels[0].range, 6..8);
    assert_eq!(diagnostic.notes.len(), 1);
}
