#![no_main]

use std::net::{IpAddr, Ipv4Addr};

use libfuzzer_sys::fuzz_target;

use logwell_core::types::MAX_PRI;
use logwell_syslog::parser::SyslogParser;

const SOURCE: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

fuzz_target!(|data: &[u8]| {
    let parser = SyslogParser::new();
    let line = String::from_utf8_lossy(data);

    // 어떤 입력에도 패닉 없이 레코드를 만들어야 한다
    let record = parser.parse(&line, SOURCE);
    assert!(record.priority <= MAX_PRI);
});
