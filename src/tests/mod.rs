mod fake_catalog;
