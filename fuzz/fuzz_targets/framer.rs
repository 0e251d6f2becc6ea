#![no_main]

use libfuzzer_sys::fuzz_target;

use logwell_syslog::framer::OctetCountFramer;

fuzz_target!(|data: &[u8]| {
    let mut framer = OctetCountFramer::new();

    // 임의 경계로 쪼개 공급해도 크래시 없이 Ok 또는 Err을 반환해야 한다
    for chunk in data.chunks(7) {
        if framer.feed(chunk).is_err() {
            // 프로토콜 위반은 연결 치명적: 같은 프레이머에 더 feed하지 않는다
            break;
        }
    }
});
