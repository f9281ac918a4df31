use tera::Tera;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("user.html", include_str!("../templates/user.html")),
    ("admin.html", include_str!("../templates/admin.html")),
];

pub fn load() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn test_pages_render_with_api_base_url() {
        let tera = load().unwrap();
        let mut ctx = Context::new();
        ctx.insert("api_base_url", "https://api.example");

        for page in ["user.html", "admin.html"] {
            let html = tera.render(page, &ctx).unwrap();
            assert!(html.contains("https://api.example"), "{} missing api base", page);
        }
    }
}
