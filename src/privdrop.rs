//! 启动前降权：切换到指定 UNIX 用户的 gid/uid。

use std::io;

/// 查询用户并依次调用 setgid、setuid。
#[cfg(unix)]
pub fn drop_privileges(username: &str) -> io::Result<()> {
    let (uid, gid) = lookup_user(username)?;
    // SAFETY: plain syscalls with values taken from the passwd database
    if unsafe { libc::setgid(gid) } != 0 {
        let err = io::Error::last_os_error();
        return Err(io::Error::new(err.kind(), format!("setgid failed: {err}")));
    }
    // SAFETY: see above; setgid must precede setuid
    if unsafe { libc::setuid(uid) } != 0 {
        let err = io::Error::last_os_error();
        return Err(io::Error::new(err.kind(), format!("setuid failed: {err}")));
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn drop_privileges(_username: &str) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "privilege drop is only supported on unix",
    ))
}

/// 在 passwd 数据库中查找用户，返回 (uid, gid)。
#[cfg(unix)]
pub fn lookup_user(username: &str) -> io::Result<(libc::uid_t, libc::gid_t)> {
    use std::ffi::CString;

    let c_username = CString::new(username)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid user name"))?;

    // SAFETY: called once during startup before any other passwd lookups; only
    // the numeric fields are read before the buffer can be reused
    let passwd = unsafe { libc::getpwnam(c_username.as_ptr()) };
    if passwd.is_null() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("failed to find user: {username}"),
        ));
    }

    // SAFETY: passwd is non-null and points to a valid passwd entry
    let (uid, gid) = unsafe { ((*passwd).pw_uid, (*passwd).pw_gid) };
    Ok((uid, gid))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn resolves_root_user() {
        let (uid, gid) = lookup_user("root").expect("root exists");
        assert_eq!(uid, 0);
        assert_eq!(gid, 0);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let err = lookup_user("kutta-no-such-user").expect_err("missing user");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(
            lookup_user("bad\0name").expect_err("nul byte").kind(),
            io::ErrorKind::InvalidInput
        );
    }
}
