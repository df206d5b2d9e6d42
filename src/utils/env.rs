// Environment variable utils

use std::env;

/// Gets boolean env var
///
/// # Arguments
/// 
/// * `var_name` - The name of the environment variable
/// * `default_val` - The default value
/// 
/// # Return value
///
/// Returns true if the value of the variable is 'YES' or 'TRUE' (Case insensitive)
/// Returns false if the value of the variable is 'NO' or 'FALSE' (Case insensitive)
/// Otherwise, returns the value of default_val
pub fn get_env_bool(var_name: &str, default_val: bool) -> bool {
    let r_var = env::var(var_name);

    match r_var {
        Ok(var_str) => {
            let var_str_upper = var_str.to_uppercase();

            match var_str_upper.as_str() {
                "YES" | "TRUE" => true,
                "NO" | "FALSE" => false,
                _ => default_val,
            }
        }
        Err(_) => default_val,
    }
}

/// Gets string env var
///
/// # Arguments
/// 
/// * `var_name` - The name of the environment variable
/// * `default_val` - The default value
/// 
/// # Return value
///
/// Returns The value of the variable as string or,
/// if not present, the value of default_val
pub fn get_env_string(var_name: &str, default_val: &str) -> String {
    let r_var = env::var(var_name);

    match r_var {
        Ok(r_var_str) => r_var_str,
        Err(_) => default_val.to_string(),
    }
}

/// Gets u32 env var
///
/// # Arguments
/// 
/// * `var_name` - The name of the environment variable
/// * `default_val` - The default value
/// 
/// # Return value
///
/// Returns The value of the variable as u32 or,
/// if not present or invalid, the value of default_val
pub fn get_env_u32(var_name: &str, default_val: u32) -> u32 {
    let r_var = env::var(var_name);

    match r_var {
        Ok(var_str) => {
            let r_num: Result<u32, _> = var_str.parse();

            match r_num {
                Ok(num) => num,
                Err(_) => default_val,
            }
        }
        Err(_) => default_val,
    }
}

/// Gets list env var
///
/// # Arguments
///
/// * `var_name` - The name of the environment variable
/// * `separator` - Separator between the items
///
/// # Return value
///
/// Returns the trimmed, non empty items of the variable.
/// If not present, returns an empty list
pub fn get_env_list(var_name: &str, separator: char) -> Vec<String> {
    match env::var(var_name) {
        Ok(var_str) => split_list(&var_str, separator),
        Err(_) => Vec::new(),
    }
}

fn split_list(list: &str, separator: char) -> Vec<String> {
    list.split(separator)
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" rtmp://a/live/x , ,rtmp://b/live/y", ','),
            vec!["rtmp://a/live/x".to_string(), "rtmp://b/live/y".to_string()]
        );
        assert!(split_list("", ',').is_empty());
    }

    #[test]
    fn test_missing_vars_use_defaults() {
        assert!(get_env_bool("RTMP_CLIENT_TEST_UNSET_BOOL", true));
        assert_eq!(get_env_u32("RTMP_CLIENT_TEST_UNSET_U32", 7), 7);
        assert_eq!(get_env_string("RTMP_CLIENT_TEST_UNSET_STR", "x"), "x");
        assert!(get_env_list("RTMP_CLIENT_TEST_UNSET_LIST", ',').is_empty());
    }
}
