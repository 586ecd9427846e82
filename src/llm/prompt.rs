//! 提示词模板：纯数据模板与渲染后的请求分离

/// 渲染完成、可以直接发送给模型的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub system: String,
    pub user: String,
}

impl PromptRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// 带 `{slot}` 占位符的提示词模板
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    pub const fn new(system: &'static str, user: &'static str) -> Self {
        Self { system, user }
    }

    /// 用给定的槽位值填充模板
    ///
    /// 只替换出现在 `slots` 中的占位符，其余花括号原样保留（公式、代码块中经常出现）。
    /// 替换只做一遍，槽位值中的花括号不会被再次展开。
    pub fn render(&self, slots: &[(&str, &str)]) -> PromptRequest {
        PromptRequest {
            system: fill(self.system, slots),
            user: fill(self.user, slots),
        }
    }
}

fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after[..end];
        match slots.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
