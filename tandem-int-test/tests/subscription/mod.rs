mod subscription_test;
