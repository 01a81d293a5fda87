use firmware_shell::{GetOpt, GetOptError, parse_hex};

fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(String::from).collect()
}

/// `range-is-mapped [-v] [-q] <start> <length>` as the tool reads it.
fn range_args(line: &str) -> Result<(bool, u64, u64), GetOptError> {
    let args = words(line);
    let mut quiet = false;
    let mut opts = GetOpt::new(&args, "");
    for opt in opts.by_ref() {
        match opt.flag {
            'v' => {}
            'q' => quiet = true,
            _ => return Err(opt.unknown()),
        }
    }
    let [start, length, ..] = opts.operands() else {
        return Err(GetOptError::MissingOperand);
    };
    Ok((quiet, parse_hex(start)?, parse_hex(length)?))
}

#[test]
fn range_command_lines() {
    assert_eq!(
        range_args("range-is-mapped 0x7f000000 1000"),
        Ok((false, 0x7f00_0000, 0x1000))
    );
    assert_eq!(
        range_args("range-is-mapped -v -q 0 0x1"),
        Ok((true, 0, 1))
    );
    assert_eq!(
        range_args("range-is-mapped -x 0 1"),
        Err(GetOptError::UnknownOption('x'))
    );
    assert_eq!(
        range_args("range-is-mapped 0x1000"),
        Err(GetOptError::MissingOperand)
    );
    assert_eq!(
        range_args("range-is-mapped 0x1000 lots"),
        Err(GetOptError::InvalidNumber)
    );
}

#[test]
fn directory_operand_after_flags() {
    let args = words("acpi-dump -n -q tables\\qemu extra");
    let mut opts = GetOpt::new(&args, "");
    let flags: String = opts.by_ref().map(|o| o.flag).collect();
    assert_eq!(flags, "nq");
    assert_eq!(opts.operands().first().map(String::as_str), Some("tables\\qemu"));
}

#[test]
fn errors_map_to_invalid_parameter() {
    for e in [
        GetOptError::UnknownOption('z'),
        GetOptError::MissingArgument('d'),
        GetOptError::MissingOperand,
        GetOptError::InvalidNumber,
    ] {
        assert_eq!(uefi::Status::from(e), uefi::Status::INVALID_PARAMETER);
    }
    assert_eq!(
        GetOptError::UnknownOption('z').to_string(),
        "Unknown option 'z'"
    );
}
